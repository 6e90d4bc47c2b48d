use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::{
    dto::{SignupsParams, SummaryResponse, WindowParams},
    services::{self, DAY_INTERVAL},
    window,
};
use crate::{
    auth::extractors::AuthUser,
    dates::DateRange,
    error::ApiResult,
    extract::QueryParams,
    state::AppState,
    users::repo_types::DailyCount,
};

pub fn metrics_routes() -> Router<AppState> {
    Router::new()
        .route("/metrics/summary", get(summary))
        .route("/metrics/signups", get(signups))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    _caller: AuthUser,
    QueryParams(params): QueryParams<WindowParams>,
) -> ApiResult<Json<SummaryResponse>> {
    let (start, end) = window::resolve(
        params.start.as_deref(),
        params.end.as_deref(),
        OffsetDateTime::now_utc(),
    );
    Ok(Json(services::summary(state.store.as_ref(), start, end).await?))
}

#[instrument(skip(state))]
pub async fn signups(
    State(state): State<AppState>,
    _caller: AuthUser,
    QueryParams(params): QueryParams<SignupsParams>,
) -> ApiResult<Json<Vec<DailyCount>>> {
    let (start, end) = window::resolve(
        params.start.as_deref(),
        params.end.as_deref(),
        OffsetDateTime::now_utc(),
    );
    let range = DateRange::between(start, end);
    let interval = params.interval.as_deref().unwrap_or(DAY_INTERVAL);
    Ok(Json(
        services::daily_signups(state.store.as_ref(), range, interval).await?,
    ))
}
