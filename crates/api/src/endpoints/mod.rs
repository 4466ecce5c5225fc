//! API endpoints.

mod admin;
mod auth;
mod cron;
mod groups;
mod messages;
mod notifications;
mod posts;
mod reports;
mod shop;
mod users;

use std::future::Future;

use axum::Router;
use fandom_common::{AppError, AppResult};
use fandom_core::{RouteCache, services::route_cache};
use fandom_db::entities::post;
use serde::Serialize;
use serde_json::Value;

use crate::{middleware::AppState, response::ApiResponse};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(posts::router())
        .merge(groups::router())
        .nest("/users", users::router())
        .nest("/reports", reports::router())
        .nest("/shop", shop::router())
        .nest("/messages", messages::router())
        .nest("/notifications", notifications::router())
        .nest("/cron", cron::router())
        .nest("/admin", admin::router())
}

/// Serve a page payload, going through the route cache when `key` is set.
///
/// Handlers only pass a key for anonymous viewers on the default page.
async fn cached<T, F>(
    cache: &RouteCache,
    key: Option<&str>,
    load: F,
) -> AppResult<ApiResponse<Value>>
where
    T: Serialize,
    F: Future<Output = AppResult<T>>,
{
    if let Some(key) = key {
        if let Some(hit) = cache.get(key).await {
            return Ok(ApiResponse::ok(hit));
        }
    }

    let payload = serde_json::to_value(load.await?)
        .map_err(|e| AppError::Internal(format!("Failed to serialize page: {e}")))?;

    if let Some(key) = key {
        cache.put(key, payload.clone()).await;
    }
    Ok(ApiResponse::ok(payload))
}

/// Drop every cached page a post can appear on.
async fn revalidate_post(cache: &RouteCache, post: &post::Model) {
    let mut paths = vec![
        route_cache::post_path(&post.id),
        route_cache::COMMUNITY.to_string(),
    ];
    if post.is_news {
        paths.push(route_cache::NEWS.to_string());
    }
    cache.revalidate(&paths).await;

    if post.group_id.is_some() {
        cache.revalidate_prefix("/groups/").await;
    }
    cache.revalidate_prefix("/users/").await;
}

/// Drop all content pages. Used after bulk changes such as member deletion.
async fn revalidate_content(cache: &RouteCache) {
    cache
        .revalidate(&[route_cache::COMMUNITY, route_cache::NEWS])
        .await;
    for prefix in ["/posts/", "/groups/", "/users/"] {
        cache.revalidate_prefix(prefix).await;
    }
}
