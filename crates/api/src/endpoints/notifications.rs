//! Notifications endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use fandom_common::AppResult;
use fandom_db::entities::notification;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    20
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Get notifications for the current user.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<notification::Model>>> {
    let limit = query.limit.clamp(1, 100);
    let notifications = state
        .notification_service
        .list(&user.id, query.unread_only, limit)
        .await?;
    Ok(ApiResponse::ok(notifications))
}

async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Done>> {
    state.notification_service.mark_read(&user.id, &id).await?;
    Ok(ApiResponse::done())
}

/// Mark everything as read; returns how many were updated.
async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.mark_all_read(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/{id}/read", post(mark_read))
        .route("/read-all", post(mark_all_read))
}
