//! Direct message endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use fandom_common::AppResult;
use fandom_core::{Inbox, MessageView, SendMessageInput};
use fandom_db::entities::message;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

/// Received messages plus active announcements.
async fn inbox(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Inbox>> {
    let inbox = state.messaging_service.inbox(&user.id).await?;
    Ok(ApiResponse::ok(inbox))
}

async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<ApiResponse<message::Model>> {
    let message = state.messaging_service.send(&user, input).await?;
    Ok(ApiResponse::ok(message))
}

async fn sent(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<MessageView>>> {
    let messages = state.messaging_service.sent(&user.id).await?;
    Ok(ApiResponse::ok(messages))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Done>> {
    state.messaging_service.mark_read(&user.id, &id).await?;
    Ok(ApiResponse::done())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox).post(send))
        .route("/sent", get(sent))
        .route("/{id}/read", post(mark_read))
}
