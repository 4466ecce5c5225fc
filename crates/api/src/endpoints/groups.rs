//! Group pages, manager applications and category requests.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use fandom_common::{AppError, AppResult};
use fandom_core::{
    ApplyInput, GroupDetail, Pagination, PostSummary, SubmitCategoryInput, services::route_cache,
};
use fandom_db::entities::{category_request, fan_group::GroupType, manager_application};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cached;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Default, Deserialize)]
pub struct GroupListQuery {
    #[serde(rename = "type")]
    pub group_type: Option<GroupType>,
}

/// Group page: the group, its moderators and its feed.
#[derive(Serialize)]
pub struct GroupPage {
    #[serde(flatten)]
    pub detail: GroupDetail,
    pub posts: Vec<PostSummary>,
}

/// All groups, optionally filtered by type.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<GroupListQuery>,
) -> AppResult<ApiResponse<Value>> {
    let key = (viewer.is_none() && query.group_type.is_none()).then_some(route_cache::GROUPS);
    cached(
        &state.route_cache,
        key,
        state.group_service.list(query.group_type),
    )
    .await
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Value>> {
    let path = route_cache::group_path(&slug);
    let key = (viewer.is_none() && page.is_first_default()).then_some(path.as_str());

    let load = async {
        let detail = state.group_service.detail(&slug).await?;
        let posts = state
            .post_service
            .group_feed(&detail.group.id, page)
            .await?;
        Ok::<_, AppError>(GroupPage { detail, posts })
    };
    cached(&state.route_cache, key, load).await
}

/// Ask to become a manager of a group.
async fn apply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<ApplyInput>,
) -> AppResult<ApiResponse<manager_application::Model>> {
    let application = state
        .application_service
        .apply(&user.id, &slug, input)
        .await?;
    Ok(ApiResponse::ok(application))
}

/// Suggest a new group.
async fn request_category(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitCategoryInput>,
) -> AppResult<ApiResponse<category_request::Model>> {
    let request = state
        .category_request_service
        .submit(&user.id, input)
        .await?;
    Ok(ApiResponse::ok(request))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list))
        .route("/groups/{slug}", get(show))
        .route("/groups/{slug}/apply", post(apply))
        .route("/category-requests", post(request_category))
}
