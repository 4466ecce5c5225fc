//! Points shop endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use fandom_common::AppResult;
use fandom_core::{CosmeticSlot, ShopItem, ShopPage, services::route_cache};
use fandom_db::entities::purchase;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Done},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UnequipRequest {
    pub slot: CosmeticSlot,
}

/// Catalog with ownership flags for the caller.
async fn catalog(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ShopPage>> {
    let page = state.shop_service.catalog(user.as_ref()).await?;
    Ok(ApiResponse::ok(page))
}

async fn purchase(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ItemRequest>,
) -> AppResult<ApiResponse<purchase::Model>> {
    let purchase = state.shop_service.purchase(&user.id, &req.item_id).await?;

    state
        .route_cache
        .revalidate(&[
            route_cache::RANKING.to_string(),
            route_cache::user_path(&user.username),
        ])
        .await;
    Ok(ApiResponse::ok(purchase))
}

async fn equip(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ItemRequest>,
) -> AppResult<ApiResponse<&'static ShopItem>> {
    let item = state.shop_service.equip(&user.id, &req.item_id).await?;

    // Cosmetics show up on author cards everywhere
    super::revalidate_content(&state.route_cache).await;
    Ok(ApiResponse::ok(item))
}

async fn unequip(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UnequipRequest>,
) -> AppResult<ApiResponse<Done>> {
    state.shop_service.unequip(&user.id, req.slot).await?;

    super::revalidate_content(&state.route_cache).await;
    Ok(ApiResponse::done())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog))
        .route("/purchase", post(purchase))
        .route("/equip", post(equip))
        .route("/unequip", post(unequip))
}
