use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{LoginRequest, RegisterRequest, TokenResponse},
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    state::AppState,
    users::repo_types::NewUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let role = payload.granted_role();
    let email = payload.email;

    // Ensure email is not taken
    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = state.passwords.hash_blocking(payload.password).await?;
    let user = state
        .store
        .create(NewUser {
            name: payload.name,
            email,
            password_hash,
            role,
            bio: None,
            avatar_url: None,
        })
        .await?;

    let token = state.jwt.sign(user.id, user.role)?;
    info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user registered");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = payload.email;

    let user = match state.store.find_by_email(&email).await? {
        Some(u) if !u.disabled => u,
        Some(u) => {
            warn!(user_id = %u.id, "login on disabled account");
            return Err(ApiError::InvalidCredentials);
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let ok = state
        .passwords
        .verify_blocking(payload.password, user.password_hash.clone())
        .await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    state
        .store
        .touch_last_login(user.id, OffsetDateTime::now_utc())
        .await?;

    let token = state.jwt.sign(user.id, user.role)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
