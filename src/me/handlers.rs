use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{ChangePasswordRequest, OkResponse, UpdateMeRequest};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    state::AppState,
    users::repo_types::{PublicUser, UserPatch},
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/change-password", post(change_password))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = state
        .store
        .find_by_id(caller.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateMeRequest>,
) -> ApiResult<Json<PublicUser>> {
    let patch = UserPatch::from(payload);
    let user = state
        .store
        .update_by_id(caller.id, &patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<OkResponse>> {
    let user = state
        .store
        .find_by_id(caller.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let ok = state
        .passwords
        .verify_blocking(payload.current, user.password_hash)
        .await?;
    if !ok {
        warn!(user_id = %user.id, "change password with wrong current password");
        return Err(ApiError::IncorrectPassword);
    }

    let hash = state.passwords.hash_blocking(payload.next).await?;
    if !state.store.set_password(user.id, &hash).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = %user.id, "password changed");
    Ok(Json(OkResponse { ok: true }))
}
