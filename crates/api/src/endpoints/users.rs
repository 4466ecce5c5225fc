//! Profile pages and the points ranking.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use fandom_common::{AppError, AppResult};
use fandom_core::{PostSummary, PublicProfile, UpdateProfileInput, services::route_cache};
use fandom_db::entities::profile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cached;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

const DEFAULT_RANKING_SIZE: u64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<u64>,
}

/// Public profile with the member's posts.
#[derive(Serialize)]
pub struct UserPage {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub posts: Vec<PostSummary>,
}

/// Top members by points.
async fn ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> AppResult<ApiResponse<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_RANKING_SIZE);
    let key = (limit == DEFAULT_RANKING_SIZE).then_some(route_cache::RANKING);
    cached(
        &state.route_cache,
        key,
        state.profile_service.ranking(limit),
    )
    .await
}

async fn me(AuthUser(user): AuthUser) -> ApiResponse<profile::Model> {
    ApiResponse::ok(user)
}

/// Edit the caller's display name, bio or avatar.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<profile::Model>> {
    let updated = state.profile_service.update(&user.id, input).await?;

    // Author cards appear on every feed
    super::revalidate_content(&state.route_cache).await;
    Ok(ApiResponse::ok(updated))
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let path = route_cache::user_path(&username);
    let key = viewer.is_none().then_some(path.as_str());

    let load = async {
        let profile = state.profile_service.get_public(&username).await?;
        let posts = state
            .post_service
            .list_by_author(&username, viewer.as_ref())
            .await?;
        Ok::<_, AppError>(UserPage { profile, posts })
    };
    cached(&state.route_cache, key, load).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ranking", get(ranking))
        .route("/me", get(me).patch(update_me))
        .route("/{username}", get(show))
}
