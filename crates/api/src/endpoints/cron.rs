//! Scheduled job triggers.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use fandom_common::AppResult;
use fandom_core::{NewsOutcome, services::route_cache};
use serde::Deserialize;
use tracing::info;

use crate::{middleware::AppState, response::ApiResponse};

#[derive(Debug, Default, Deserialize)]
pub struct CronQuery {
    pub secret: Option<String>,
}

/// Ingest one news article. Called by an external scheduler.
async fn news(
    State(state): State<AppState>,
    Query(query): Query<CronQuery>,
) -> AppResult<ApiResponse<NewsOutcome>> {
    state.news_service.verify_secret(query.secret.as_deref())?;

    let outcome = state.news_service.run().await?;
    if let NewsOutcome::Created { post_id, .. } = &outcome {
        info!(post_id = %post_id, "News job published a post");
        state
            .route_cache
            .revalidate(&[route_cache::NEWS, route_cache::COMMUNITY])
            .await;
    }
    Ok(ApiResponse::ok(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/news", get(news))
}
