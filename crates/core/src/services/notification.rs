//! Notification service.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::notification::{self, NotificationKind},
    repositories::NotificationRepository,
};
use sea_orm::Set;
use tracing::warn;

/// Upper bound for one notification listing.
const MAX_LIST_LIMIT: u64 = 100;

/// A notification to deliver.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub actor_id: Option<String>,
    pub kind: NotificationKind,
    pub post_id: Option<String>,
    pub message: Option<String>,
}

impl NewNotification {
    #[must_use]
    pub fn new(user_id: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            user_id: user_id.into(),
            actor_id: None,
            kind,
            post_id: None,
            message: None,
        }
    }

    #[must_use]
    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    #[must_use]
    pub fn post(mut self, post_id: impl Into<String>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification. Returns `None` when the actor is the recipient.
    pub async fn create(&self, input: NewNotification) -> AppResult<Option<notification::Model>> {
        if input.actor_id.as_deref() == Some(input.user_id.as_str()) {
            return Ok(None);
        }

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id),
            actor_id: Set(input.actor_id),
            kind: Set(input.kind),
            post_id: Set(input.post_id),
            message: Set(input.message),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        self.notification_repo.create(model).await.map(Some)
    }

    /// Create a notification, logging instead of failing.
    pub async fn notify(&self, input: NewNotification) {
        let user_id = input.user_id.clone();
        let kind = input.kind;
        if let Err(e) = self.create(input).await {
            warn!(error = %e, user_id = %user_id, kind = ?kind, "Failed to create notification");
        }
    }

    /// List a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        self.notification_repo
            .find_by_user(user_id, unread_only, limit)
            .await
    }

    /// Count unread notifications.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let updated = self
            .notification_repo
            .mark_as_read(notification_id, user_id)
            .await?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("notificação {notification_id}")));
        }
        Ok(())
    }

    /// Mark every notification of the user as read.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }
}
