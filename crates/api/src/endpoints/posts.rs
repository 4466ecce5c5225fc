//! Community feed, news feed, posts, likes and comments.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use fandom_common::AppResult;
use fandom_core::{
    CommentView, CreateCommentInput, CreatePostInput, LikeState, Pagination, PostSummary,
    UpdatePostInput, services::route_cache,
};
use fandom_db::entities::{comment, post};
use serde_json::Value;

use super::{cached, revalidate_post};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Main community feed: pinned first, then newest.
async fn community(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Value>> {
    let key = (viewer.is_none() && page.is_first_default()).then_some(route_cache::COMMUNITY);
    cached(&state.route_cache, key, state.post_service.feed(page)).await
}

/// News posts published by the ingestion job.
async fn news(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Value>> {
    let key = (viewer.is_none() && page.is_first_default()).then_some(route_cache::NEWS);
    cached(&state.route_cache, key, state.post_service.news(page)).await
}

/// Publish a post, optionally inside a group.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostSummary>> {
    let summary = state.post_service.create(&user, input).await?;

    revalidate_post(&state.route_cache, &summary.post).await;
    Ok(ApiResponse::ok(summary))
}

/// Post page. Anonymous views are served from the route cache.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let path = route_cache::post_path(&id);
    if viewer.is_none() {
        if let Some(hit) = state.route_cache.get(&path).await {
            // The cached payload keeps its view count until revalidated
            state.post_service.record_view(&id).await;
            return Ok(ApiResponse::ok(hit));
        }
    }

    let key = viewer.is_none().then_some(path.as_str());
    cached(
        &state.route_cache,
        key,
        state.post_service.get(viewer.as_ref(), &id),
    )
    .await
}

/// Edit one's own post.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.update(&user, &id, input).await?;

    revalidate_post(&state.route_cache, &post).await;
    Ok(ApiResponse::ok(post))
}

/// Delete a post as its author, a group moderator or an admin.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.delete(&user, &id).await?;

    revalidate_post(&state.route_cache, &post).await;
    Ok(ApiResponse::ok(post))
}

async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeState>> {
    let like = state.like_service.toggle(&user.id, &id).await?;

    state
        .route_cache
        .revalidate(&[route_cache::post_path(&id)])
        .await;
    Ok(ApiResponse::ok(like))
}

async fn pin(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.toggle_pin(&user, &id).await?;

    revalidate_post(&state.route_cache, &post).await;
    Ok(ApiResponse::ok(post))
}

async fn hide(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.toggle_hide(&user, &id).await?;

    revalidate_post(&state.route_cache, &post).await;
    Ok(ApiResponse::ok(post))
}

/// Visible comments of a post, oldest first.
async fn comments(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentView>>> {
    // Hidden posts keep their comments hidden too
    state.post_service.get_visible(viewer.as_ref(), &id).await?;

    let comments = state.comment_service.list(&id).await?;
    Ok(ApiResponse::ok(comments))
}

async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentView>> {
    let comment = state.comment_service.create(&user, &id, input).await?;

    state
        .route_cache
        .revalidate(&[route_cache::post_path(&id), route_cache::RANKING.to_string()])
        .await;
    Ok(ApiResponse::ok(comment))
}

async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.comment_service.delete(&user, &id).await?;

    state
        .route_cache
        .revalidate(&[route_cache::post_path(&comment.post_id)])
        .await;
    Ok(ApiResponse::ok(comment))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/community", get(community))
        .route("/news", get(news))
        .route("/posts", post(create))
        .route("/posts/{id}", get(show).patch(update).delete(remove))
        .route("/posts/{id}/like", post(like))
        .route("/posts/{id}/pin", post(pin))
        .route("/posts/{id}/hide", post(hide))
        .route("/posts/{id}/comments", get(comments).post(comment))
        .route("/comments/{id}", delete(delete_comment))
}
