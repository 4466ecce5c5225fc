//! Member reports.

use axum::{Json, Router, extract::State, routing::post};
use fandom_common::AppResult;
use fandom_core::CreateReportInput;
use fandom_db::entities::report;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Report a post, comment or profile to the admins.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state.report_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create))
}
