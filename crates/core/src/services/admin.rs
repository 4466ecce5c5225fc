//! Back-office operations on members and dashboard counters.

use fandom_common::{AppError, AppResult};
use fandom_db::{
    entities::{
        manager_application::ReviewStatus, notification::NotificationKind, profile,
        report::ReportStatus,
    },
    repositories::{
        CategoryRequestRepository, CommentRepository, ManagerApplicationRepository,
        PostRepository, ProfileRepository, ReportRepository,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::{
    notification::{NewNotification, NotificationService},
    pagination::Pagination,
    points::PointsService,
};

/// Largest single adjustment, in either direction.
const MAX_ADJUSTMENT: u64 = 1_000_000;

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub profiles: u64,
    pub posts: u64,
    pub comments: u64,
    pub pending_reports: u64,
    pub pending_applications: u64,
    pub pending_category_requests: u64,
}

/// Signed points adjustment.
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustPointsInput {
    pub delta: i64,

    #[validate(length(max = 200))]
    pub reason: Option<String>,
}

/// Admin service.
#[derive(Clone)]
pub struct AdminService {
    profile_repo: ProfileRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    report_repo: ReportRepository,
    application_repo: ManagerApplicationRepository,
    category_repo: CategoryRequestRepository,
    points: PointsService,
    notifications: NotificationService,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        profile_repo: ProfileRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        report_repo: ReportRepository,
        application_repo: ManagerApplicationRepository,
        category_repo: CategoryRequestRepository,
        points: PointsService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            profile_repo,
            post_repo,
            comment_repo,
            report_repo,
            application_repo,
            category_repo,
            points,
            notifications,
        }
    }

    /// Dashboard counters.
    pub async fn stats(&self) -> AppResult<AdminStats> {
        Ok(AdminStats {
            profiles: self.profile_repo.count().await?,
            posts: self.post_repo.count().await?,
            comments: self.comment_repo.count().await?,
            pending_reports: self
                .report_repo
                .count_by_status(ReportStatus::Pending)
                .await?,
            pending_applications: self
                .application_repo
                .count_by_status(ReviewStatus::Pending)
                .await?,
            pending_category_requests: self
                .category_repo
                .count_by_status(ReviewStatus::Pending)
                .await?,
        })
    }

    /// Search members by username, display name or email.
    pub async fn list_users(
        &self,
        query: Option<&str>,
        page: Pagination,
    ) -> AppResult<Vec<profile::Model>> {
        self.profile_repo
            .search(query, page.limit(), page.offset())
            .await
    }

    /// Ban or unban a member. Banning also ends their session.
    pub async fn set_banned(
        &self,
        admin_id: &str,
        user_id: &str,
        banned: bool,
    ) -> AppResult<profile::Model> {
        if admin_id == user_id {
            return Err(AppError::BadRequest(
                "você não pode banir a si mesmo".to_string(),
            ));
        }
        if self.profile_repo.set_banned(user_id, banned).await? == 0 {
            return Err(AppError::NotFound(format!("usuário {user_id}")));
        }
        info!(admin_id = %admin_id, user_id = %user_id, banned, "Ban status changed");
        self.profile_repo.get_by_id(user_id).await
    }

    /// Grant or revoke admin rights. Admins cannot demote themselves.
    pub async fn set_admin(
        &self,
        admin_id: &str,
        user_id: &str,
        is_admin: bool,
    ) -> AppResult<profile::Model> {
        if admin_id == user_id && !is_admin {
            return Err(AppError::BadRequest(
                "você não pode remover seu próprio acesso de administrador".to_string(),
            ));
        }
        if self.profile_repo.set_admin(user_id, is_admin).await? == 0 {
            return Err(AppError::NotFound(format!("usuário {user_id}")));
        }
        info!(admin_id = %admin_id, user_id = %user_id, is_admin, "Admin flag changed");
        self.profile_repo.get_by_id(user_id).await
    }

    /// Credit or debit a member's points and tell them about it.
    pub async fn adjust_points(
        &self,
        admin_id: &str,
        user_id: &str,
        input: AdjustPointsInput,
    ) -> AppResult<profile::Model> {
        input.validate()?;
        if input.delta.unsigned_abs() > MAX_ADJUSTMENT {
            return Err(AppError::BadRequest(format!(
                "o ajuste deve ficar entre -{MAX_ADJUSTMENT} e {MAX_ADJUSTMENT}"
            )));
        }
        self.points.adjust(user_id, input.delta).await?;
        info!(admin_id = %admin_id, user_id = %user_id, delta = input.delta, "Points adjusted");

        let mut message = if input.delta > 0 {
            format!("Você recebeu {} pontos.", input.delta)
        } else {
            format!("Foram removidos {} pontos da sua conta.", input.delta.saturating_neg())
        };
        if let Some(reason) = input.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            message.push_str(" Motivo: ");
            message.push_str(reason);
        }
        self.notifications
            .notify(
                NewNotification::new(user_id, NotificationKind::Points)
                    .actor(admin_id)
                    .message(message),
            )
            .await;

        self.profile_repo.get_by_id(user_id).await
    }

    /// Permanently delete a member and everything they own.
    pub async fn delete_user(&self, admin_id: &str, user_id: &str) -> AppResult<()> {
        if admin_id == user_id {
            return Err(AppError::BadRequest(
                "use a exclusão de conta para remover a si mesmo".to_string(),
            ));
        }
        if self.profile_repo.delete(user_id).await? == 0 {
            return Err(AppError::NotFound(format!("usuário {user_id}")));
        }
        info!(admin_id = %admin_id, user_id = %user_id, "Member deleted");
        Ok(())
    }
}
