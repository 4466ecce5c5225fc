//! Admin back-office endpoints.
//!
//! Every handler takes [`AdminUser`], so non-admins get 403 and anonymous
//! callers 401 before any work is done.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use fandom_common::AppResult;
use fandom_core::{
    AdjustPointsInput, AdminStats, CreateAnnouncementInput, CreateGroupInput, DismissReportInput,
    Pagination, ResolveReportInput, UpdateGroupInput, services::route_cache,
};
use fandom_db::entities::{
    announcement, category_request, fan_group, manager_application,
    manager_application::ReviewStatus, profile, report, report::ReportStatus,
};
use serde::{Deserialize, Serialize};

use super::revalidate_content;
use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

// ---- Queries and bodies ----

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub banned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorToggleResponse {
    pub is_moderator: bool,
}

// ---- Dashboard and members ----

async fn stats(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AdminStats>> {
    Ok(ApiResponse::ok(state.admin_service.stats().await?))
}

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> AppResult<ApiResponse<Vec<profile::Model>>> {
    let page = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let users = state
        .admin_service
        .list_users(query.q.as_deref(), page)
        .await?;
    Ok(ApiResponse::ok(users))
}

async fn set_banned(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<BanRequest>,
) -> AppResult<ApiResponse<profile::Model>> {
    let user = state
        .admin_service
        .set_banned(&admin.id, &id, req.banned)
        .await?;

    state
        .route_cache
        .revalidate(&[
            route_cache::RANKING.to_string(),
            route_cache::user_path(&user.username),
        ])
        .await;
    Ok(ApiResponse::ok(user))
}

async fn set_admin(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetAdminRequest>,
) -> AppResult<ApiResponse<profile::Model>> {
    let user = state
        .admin_service
        .set_admin(&admin.id, &id, req.is_admin)
        .await?;
    Ok(ApiResponse::ok(user))
}

async fn adjust_points(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AdjustPointsInput>,
) -> AppResult<ApiResponse<profile::Model>> {
    let user = state
        .admin_service
        .adjust_points(&admin.id, &id, input)
        .await?;

    state
        .route_cache
        .revalidate(&[
            route_cache::RANKING.to_string(),
            route_cache::user_path(&user.username),
        ])
        .await;
    Ok(ApiResponse::ok(user))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Done>> {
    state.admin_service.delete_user(&admin.id, &id).await?;

    revalidate_content(&state.route_cache).await;
    Ok(ApiResponse::done())
}

// ---- Reports ----

async fn list_reports(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> AppResult<ApiResponse<Vec<report::Model>>> {
    let page = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let reports = state.report_service.list(query.status, page).await?;
    Ok(ApiResponse::ok(reports))
}

async fn resolve_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ResolveReportInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let hides = input.hide_content;
    let report = state
        .report_service
        .resolve(&admin.id, &id, input)
        .await?;

    if hides {
        revalidate_content(&state.route_cache).await;
    }
    Ok(ApiResponse::ok(report))
}

async fn dismiss_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<DismissReportInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .dismiss(&admin.id, &id, input)
        .await?;
    Ok(ApiResponse::ok(report))
}

// ---- Manager applications ----

async fn list_applications(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<ApiResponse<Vec<manager_application::Model>>> {
    let applications = state.application_service.list(query.status).await?;
    Ok(ApiResponse::ok(applications))
}

async fn approve_application(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<manager_application::Model>> {
    let application = state
        .application_service
        .approve(&admin.id, &id)
        .await?;

    // Moderator lists live on group pages
    state.route_cache.revalidate_prefix("/groups/").await;
    Ok(ApiResponse::ok(application))
}

async fn reject_application(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<manager_application::Model>> {
    let application = state.application_service.reject(&admin.id, &id).await?;
    Ok(ApiResponse::ok(application))
}

// ---- Category requests ----

async fn list_category_requests(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<ApiResponse<Vec<category_request::Model>>> {
    let requests = state.category_request_service.list(query.status).await?;
    Ok(ApiResponse::ok(requests))
}

async fn approve_category_request(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<category_request::Model>> {
    let request = state
        .category_request_service
        .approve(&admin.id, &id)
        .await?;

    state.route_cache.revalidate(&[route_cache::GROUPS]).await;
    Ok(ApiResponse::ok(request))
}

async fn reject_category_request(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<category_request::Model>> {
    let request = state
        .category_request_service
        .reject(&admin.id, &id)
        .await?;
    Ok(ApiResponse::ok(request))
}

// ---- Groups ----

async fn create_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<ApiResponse<fan_group::Model>> {
    let group = state.group_service.create(input).await?;

    state.route_cache.revalidate(&[route_cache::GROUPS]).await;
    Ok(ApiResponse::ok(group))
}

async fn update_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateGroupInput>,
) -> AppResult<ApiResponse<fan_group::Model>> {
    let group = state.group_service.update(&id, input).await?;

    state
        .route_cache
        .revalidate(&[
            route_cache::GROUPS.to_string(),
            route_cache::group_path(&group.slug),
        ])
        .await;
    Ok(ApiResponse::ok(group))
}

async fn delete_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<fan_group::Model>> {
    let group = state.group_service.delete(&id).await?;

    // Group posts go with the group
    state.route_cache.revalidate(&[route_cache::GROUPS]).await;
    revalidate_content(&state.route_cache).await;
    Ok(ApiResponse::ok(group))
}

async fn toggle_moderator(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<ModeratorToggleResponse>> {
    let is_moderator = state
        .group_service
        .toggle_moderator(&id, &user_id)
        .await?;

    state.route_cache.revalidate_prefix("/groups/").await;
    Ok(ApiResponse::ok(ModeratorToggleResponse { is_moderator }))
}

// ---- Announcements ----

async fn list_announcements(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<announcement::Model>>> {
    let announcements = state.announcement_service.list_all(page).await?;
    Ok(ApiResponse::ok(announcements))
}

async fn create_announcement(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateAnnouncementInput>,
) -> AppResult<ApiResponse<announcement::Model>> {
    let announcement = state
        .announcement_service
        .create(&admin.id, input)
        .await?;
    Ok(ApiResponse::ok(announcement))
}

async fn toggle_announcement(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<announcement::Model>> {
    let announcement = state.announcement_service.toggle_active(&id).await?;
    Ok(ApiResponse::ok(announcement))
}

async fn delete_announcement(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Done>> {
    state.announcement_service.delete(&id).await?;
    Ok(ApiResponse::done())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/ban", post(set_banned))
        .route("/users/{id}/admin", post(set_admin))
        .route("/users/{id}/points", post(adjust_points))
        .route("/reports", get(list_reports))
        .route("/reports/{id}/resolve", post(resolve_report))
        .route("/reports/{id}/dismiss", post(dismiss_report))
        .route("/applications", get(list_applications))
        .route("/applications/{id}/approve", post(approve_application))
        .route("/applications/{id}/reject", post(reject_application))
        .route("/category-requests", get(list_category_requests))
        .route(
            "/category-requests/{id}/approve",
            post(approve_category_request),
        )
        .route(
            "/category-requests/{id}/reject",
            post(reject_category_request),
        )
        .route("/groups", post(create_group))
        .route("/groups/{id}", patch(update_group).delete(delete_group))
        .route(
            "/groups/{id}/moderators/{user_id}",
            post(toggle_moderator),
        )
        .route(
            "/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/announcements/{id}", delete(delete_announcement))
        .route("/announcements/{id}/toggle", post(toggle_announcement))
}
