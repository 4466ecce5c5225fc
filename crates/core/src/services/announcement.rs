//! Site-wide announcements shown in every inbox.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{entities::announcement, repositories::AnnouncementRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::pagination::Pagination;

/// Active announcements attached to an inbox.
const ACTIVE_LIMIT: u64 = 10;

/// Input for publishing an announcement.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnnouncementInput {
    #[validate(length(min = 1, max = 150))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Announcement service.
#[derive(Clone)]
pub struct AnnouncementService {
    announcement_repo: AnnouncementRepository,
    id_gen: IdGenerator,
}

impl AnnouncementService {
    /// Create a new announcement service.
    #[must_use]
    pub const fn new(announcement_repo: AnnouncementRepository) -> Self {
        Self {
            announcement_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a new, active announcement.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateAnnouncementInput,
    ) -> AppResult<announcement::Model> {
        input.validate()?;

        let title = input.title.trim();
        let content = input.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::BadRequest(
                "título e conteúdo são obrigatórios".to_string(),
            ));
        }

        let model = announcement::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };

        let announcement = self.announcement_repo.create(model).await?;
        info!(announcement_id = %announcement.id, author_id = %author_id, "Announcement published");
        Ok(announcement)
    }

    /// Every announcement, newest first.
    pub async fn list_all(&self, page: Pagination) -> AppResult<Vec<announcement::Model>> {
        self.announcement_repo
            .find_all(page.limit(), page.offset())
            .await
    }

    /// Announcements currently delivered to inboxes.
    pub async fn active(&self) -> AppResult<Vec<announcement::Model>> {
        self.announcement_repo.find_active(ACTIVE_LIMIT).await
    }

    /// Flip the active flag and return the updated row.
    pub async fn toggle_active(&self, id: &str) -> AppResult<announcement::Model> {
        if self.announcement_repo.toggle_active(id).await? == 0 {
            return Err(AppError::NotFound(format!("aviso {id}")));
        }
        self.announcement_repo.get_by_id(id).await
    }

    /// Delete an announcement.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.announcement_repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!("aviso {id}")));
        }
        info!(announcement_id = %id, "Announcement deleted");
        Ok(())
    }
}
