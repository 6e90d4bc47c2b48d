use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{
        parse_id, BulkUpdateRequest, BulkUpdateResponse, CreateUserRequest, DeletedResponse,
        UpdateUserRequest, UserListResponse,
    },
    query::{ListParams, ListQuery, SuggestParams, SuggestQuery},
    repo_types::{BulkPatch, NewUser, PublicUser, UserPatch, UserSuggestion},
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::{ApiError, ApiResult},
    extract::{QueryParams, ValidatedJson},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/suggestions", get(suggest_users))
        .route("/users/bulk", patch(bulk_update))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<UserListResponse>> {
    let query = ListQuery::from(&params);
    let (total, users) = tokio::try_join!(
        state.store.count(&query.filter),
        state
            .store
            .list(&query.filter, query.sort, query.skip(), query.limit),
    )?;

    Ok(Json(UserListResponse {
        data: users.into_iter().map(PublicUser::from).collect(),
        page: query.page,
        total,
    }))
}

#[instrument(skip(state))]
pub async fn suggest_users(
    State(state): State<AppState>,
    _caller: AuthUser,
    QueryParams(params): QueryParams<SuggestParams>,
) -> ApiResult<Json<Vec<UserSuggestion>>> {
    let Some(query) = SuggestQuery::from_params(&params) else {
        return Ok(Json(Vec::new()));
    };
    let users = state.store.suggest(&query.keyword, query.limit).await?;
    Ok(Json(users.into_iter().map(UserSuggestion::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<PublicUser>> {
    let id = parse_id(&raw_id).ok_or(ApiError::NotFound)?;
    let user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let email = payload.email;

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
            role: payload.role,
            bio: payload.bio,
            avatar_url: payload.avatar_url,
        })
        .await?;

    info!(admin_id = %admin.id, user_id = %user.id, role = user.role.as_str(), "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(raw_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<PublicUser>> {
    let id = parse_id(&raw_id);
    let is_self = id == Some(caller.id);
    if !caller.is_admin() && !is_self {
        warn!(user_id = %caller.id, target = %raw_id, "update of another user refused");
        return Err(ApiError::Forbidden);
    }
    let id = id.ok_or(ApiError::NotFound)?;

    let patch = UserPatch::from(payload);
    let patch = if caller.is_admin() {
        patch
    } else {
        patch.self_service()
    };

    let user = state
        .store
        .update_by_id(id, &patch)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(user_id = %caller.id, target = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let id = parse_id(&raw_id).ok_or(ApiError::NotFound)?;
    if !state.store.delete_by_id(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(admin_id = %admin.id, user_id = %id, "user deleted");
    Ok(Json(DeletedResponse { ok: true }))
}

#[instrument(skip(state, payload))]
pub async fn bulk_update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<BulkUpdateRequest>,
) -> ApiResult<Json<BulkUpdateResponse>> {
    let ids: Vec<_> = payload.ids.iter().filter_map(|raw| parse_id(raw)).collect();
    let patch = BulkPatch {
        disabled: payload.disabled,
        role: payload.role,
    };

    if patch.is_empty() {
        debug!(admin_id = %admin.id, "bulk update carries no changes");
    }

    let outcome = state.store.update_many(&ids, patch).await?;

    info!(
        admin_id = %admin.id,
        requested = payload.ids.len(),
        matched = outcome.matched,
        modified = outcome.modified,
        "bulk update applied"
    );
    Ok(Json(BulkUpdateResponse {
        ids: payload.ids,
        matched: outcome.matched,
        modified: outcome.modified,
    }))
}
