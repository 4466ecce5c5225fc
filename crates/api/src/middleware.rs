//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Uri, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use fandom_common::{Config, PageSource, config::AuthConfig};
use fandom_core::{
    AdminService, AnnouncementService, ApplicationService, AuthService, CategoryRequestService,
    CommentService, GroupService, LikeService, LlmClient, MessagingService, NewsService,
    NotificationService, PermissionService, PointsService, PostService, ProfileService,
    ReportService, RouteCache, ShopService,
};
use fandom_db::repositories::{
    AnnouncementRepository, CategoryRequestRepository, CommentRepository, FanGroupRepository,
    ManagerApplicationRepository, MessageRepository, ModeratorRepository, NotificationRepository,
    PostLikeRepository, PostRepository, ProfileRepository, PurchaseRepository, ReportRepository,
};
use sea_orm::DatabaseConnection;
use tracing::{Span, debug_span, warn};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub profile_service: ProfileService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub group_service: GroupService,
    pub application_service: ApplicationService,
    pub category_request_service: CategoryRequestService,
    pub report_service: ReportService,
    pub shop_service: ShopService,
    pub messaging_service: MessagingService,
    pub announcement_service: AnnouncementService,
    pub notification_service: NotificationService,
    pub admin_service: AdminService,
    pub news_service: NewsService,
    pub route_cache: RouteCache,
    pub auth_config: AuthConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        pages: Arc<dyn PageSource>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let profile_repo = ProfileRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let like_repo = PostLikeRepository::new(Arc::clone(&db));
        let group_repo = FanGroupRepository::new(Arc::clone(&db));
        let moderator_repo = ModeratorRepository::new(Arc::clone(&db));
        let application_repo = ManagerApplicationRepository::new(Arc::clone(&db));
        let category_repo = CategoryRequestRepository::new(Arc::clone(&db));
        let report_repo = ReportRepository::new(Arc::clone(&db));
        let purchase_repo = PurchaseRepository::new(Arc::clone(&db));
        let message_repo = MessageRepository::new(Arc::clone(&db));
        let announcement_repo = AnnouncementRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));

        let points = PointsService::new(profile_repo.clone(), config.economy.clone());
        let permissions = PermissionService::new(moderator_repo.clone());
        let notification_service = NotificationService::new(notification_repo);
        let announcement_service = AnnouncementService::new(announcement_repo);
        let group_service = GroupService::new(
            group_repo.clone(),
            moderator_repo.clone(),
            profile_repo.clone(),
        );

        let comment_service = CommentService::new(
            comment_repo.clone(),
            post_repo.clone(),
            profile_repo.clone(),
            permissions.clone(),
            points.clone(),
            notification_service.clone(),
        );

        Self {
            auth_service: AuthService::new(profile_repo.clone(), points.clone()),
            profile_service: ProfileService::new(profile_repo.clone(), post_repo.clone()),
            post_service: PostService::new(
                post_repo.clone(),
                group_repo.clone(),
                profile_repo.clone(),
                comment_repo.clone(),
                like_repo.clone(),
                permissions.clone(),
                points.clone(),
            ),
            comment_service: comment_service.clone(),
            like_service: LikeService::new(
                like_repo,
                post_repo.clone(),
                notification_service.clone(),
            ),
            application_service: ApplicationService::new(
                application_repo.clone(),
                group_repo.clone(),
                moderator_repo,
                group_service.clone(),
                notification_service.clone(),
            ),
            category_request_service: CategoryRequestService::new(
                category_repo.clone(),
                group_repo,
                group_service.clone(),
                notification_service.clone(),
            ),
            report_service: ReportService::new(
                report_repo.clone(),
                post_repo.clone(),
                comment_service,
                profile_repo.clone(),
                notification_service.clone(),
            ),
            shop_service: ShopService::new(purchase_repo, profile_repo.clone(), points.clone()),
            messaging_service: MessagingService::new(
                message_repo,
                profile_repo.clone(),
                points.clone(),
                announcement_service.clone(),
                notification_service.clone(),
            ),
            admin_service: AdminService::new(
                profile_repo.clone(),
                post_repo.clone(),
                comment_repo,
                report_repo,
                application_repo,
                category_repo,
                points,
                notification_service.clone(),
            ),
            news_service: NewsService::new(
                post_repo,
                profile_repo,
                pages,
                llm,
                config.news.clone(),
                &config.cron,
            ),
            group_service,
            announcement_service,
            notification_service,
            route_cache: RouteCache::default(),
            auth_config: config.auth.clone(),
        }
    }
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
fn session_token(req: &Request<Body>, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(cookie_name)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Request URI for logs. Query strings can carry secrets, so only the path is kept.
fn loggable_uri(uri: &Uri) -> String {
    match uri.query() {
        Some(_) => format!("{}?[redacted]", uri.path()),
        None => uri.path().to_string(),
    }
}

/// Span for `TraceLayer::make_span_with`, logging the path without its query.
pub fn request_span(req: &Request<Body>) -> Span {
    debug_span!(
        "request",
        method = %req.method(),
        uri = %loggable_uri(req.uri()),
        version = ?req.version(),
    )
}

/// Authentication middleware.
///
/// Resolves the session into a `profile::Model` request extension. Unknown
/// tokens and banned accounts leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(&req, &state.auth_config.cookie_name) {
        match state.auth_service.authenticate_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Session lookup failed"),
        }
    }

    next.run(req).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(auth: Option<&str>, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/community");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_session_token_sources() {
        assert_eq!(
            session_token(&request(Some("Bearer abc"), None), "fandom_session").as_deref(),
            Some("abc")
        );
        assert_eq!(
            session_token(&request(None, Some("fandom_session=xyz; theme=dark")), "fandom_session")
                .as_deref(),
            Some("xyz")
        );
        // Header wins over cookie
        assert_eq!(
            session_token(
                &request(Some("Bearer abc"), Some("fandom_session=xyz")),
                "fandom_session"
            )
            .as_deref(),
            Some("abc")
        );
        assert!(session_token(&request(Some("Basic abc"), None), "fandom_session").is_none());
        assert!(session_token(&request(None, None), "fandom_session").is_none());
    }

    #[test]
    fn test_loggable_uri_drops_query() {
        let uri: Uri = "/api/cron/news?secret=hunter2".parse().unwrap();
        assert_eq!(loggable_uri(&uri), "/api/cron/news?[redacted]");

        let uri: Uri = "/api/community".parse().unwrap();
        assert_eq!(loggable_uri(&uri), "/api/community");
    }
}
