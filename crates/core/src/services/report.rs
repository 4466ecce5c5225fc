//! Content reports and their resolution.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{
        notification::NotificationKind,
        report::{self, ReportStatus, ReportTarget},
    },
    repositories::{PostRepository, ProfileRepository, ReportRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::{
    comment::CommentService,
    notification::{NewNotification, NotificationService},
    pagination::Pagination,
};

/// Input for reporting a post, comment or profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    pub target_type: ReportTarget,

    #[validate(length(min = 1, max = 32))]
    pub target_id: String,

    #[validate(length(min = 5, max = 1000))]
    pub reason: String,
}

/// Admin decision on a report.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReportInput {
    #[validate(length(max = 1000))]
    pub note: Option<String>,

    /// Soft-hide the reported post or comment.
    #[serde(default)]
    pub hide_content: bool,
}

/// Admin dismissal of a report.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DismissReportInput {
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Report service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    post_repo: PostRepository,
    comments: CommentService,
    profile_repo: ProfileRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        post_repo: PostRepository,
        comments: CommentService,
        profile_repo: ProfileRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            report_repo,
            post_repo,
            comments,
            profile_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report against an existing target.
    pub async fn create(
        &self,
        reporter_id: &str,
        input: CreateReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;

        let exists = match input.target_type {
            ReportTarget::Post => self.post_repo.find_by_id(&input.target_id).await?.is_some(),
            ReportTarget::Comment => self.comments.exists(&input.target_id).await?,
            ReportTarget::Profile => {
                if input.target_id == reporter_id {
                    return Err(AppError::BadRequest(
                        "você não pode denunciar a si mesmo".to_string(),
                    ));
                }
                self.profile_repo
                    .find_by_id(&input.target_id)
                    .await?
                    .is_some()
            }
        };
        if !exists {
            return Err(AppError::NotFound(format!(
                "alvo da denúncia {}",
                input.target_id
            )));
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(reporter_id.to_string()),
            target_type: Set(input.target_type),
            target_id: Set(input.target_id),
            reason: Set(input.reason.trim().to_string()),
            status: Set(ReportStatus::Pending),
            resolved_by: Set(None),
            resolution_note: Set(None),
            created_at: Set(Utc::now().into()),
            resolved_at: Set(None),
        };

        let report = self.report_repo.create(model).await?;
        info!(report_id = %report.id, target_type = ?report.target_type, target_id = %report.target_id, "Report filed");
        Ok(report)
    }

    /// List reports, optionally by status.
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        page: Pagination,
    ) -> AppResult<Vec<report::Model>> {
        self.report_repo
            .list(status, page.limit(), page.offset())
            .await
    }

    /// Resolve a pending report, optionally hiding the reported content.
    pub async fn resolve(
        &self,
        admin_id: &str,
        id: &str,
        input: ResolveReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;
        let report = self.get_pending(id).await?;

        if input.hide_content {
            match report.target_type {
                ReportTarget::Post => {
                    if self.post_repo.set_hidden(&report.target_id, true).await? == 0 {
                        return Err(AppError::NotFound(format!("post {}", report.target_id)));
                    }
                }
                ReportTarget::Comment => {
                    self.comments.set_hidden(&report.target_id, true).await?;
                }
                ReportTarget::Profile => {}
            }
            info!(report_id = %id, target_id = %report.target_id, "Reported content hidden");
        }

        let closed = self
            .close(report, ReportStatus::Resolved, admin_id, input.note)
            .await?;

        self.notifications
            .notify(
                NewNotification::new(&closed.reporter_id, NotificationKind::Moderation)
                    .message("Sua denúncia foi analisada e resolvida. Obrigado!"),
            )
            .await;

        Ok(closed)
    }

    /// Dismiss a pending report.
    pub async fn dismiss(
        &self,
        admin_id: &str,
        id: &str,
        input: DismissReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;
        let report = self.get_pending(id).await?;
        self.close(report, ReportStatus::Dismissed, admin_id, input.note)
            .await
    }

    async fn get_pending(&self, id: &str) -> AppResult<report::Model> {
        let report = self.report_repo.get_by_id(id).await?;
        if report.status != ReportStatus::Pending {
            return Err(AppError::BadRequest(
                "esta denúncia já foi encerrada".to_string(),
            ));
        }
        Ok(report)
    }

    /// Close a report still pending in the database and return the closed row.
    async fn close(
        &self,
        report: report::Model,
        status: ReportStatus,
        admin_id: &str,
        note: Option<String>,
    ) -> AppResult<report::Model> {
        let now = Utc::now();
        let updated = self
            .report_repo
            .close(&report.id, status, admin_id, note.as_deref(), now)
            .await?;
        if updated == 0 {
            return Err(AppError::BadRequest(
                "esta denúncia já foi encerrada".to_string(),
            ));
        }
        info!(report_id = %report.id, status = ?status, admin_id = %admin_id, "Report closed");

        Ok(report::Model {
            status,
            resolved_by: Some(admin_id.to_string()),
            resolution_note: note,
            resolved_at: Some(now.into()),
            ..report
        })
    }
}
