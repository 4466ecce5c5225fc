//! Announcement repository.

use std::sync::Arc;

use crate::entities::{Announcement, announcement};
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

/// Announcement repository for database operations.
#[derive(Clone)]
pub struct AnnouncementRepository {
    db: Arc<DatabaseConnection>,
}

impl AnnouncementRepository {
    /// Create a new announcement repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an announcement by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<announcement::Model>> {
        Announcement::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an announcement by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<announcement::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("aviso {id}")))
    }

    /// Active announcements, newest first.
    pub async fn find_active(&self, limit: u64) -> AppResult<Vec<announcement::Model>> {
        Announcement::find()
            .filter(announcement::Column::IsActive.eq(true))
            .order_by_desc(announcement::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All announcements, newest first.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<announcement::Model>> {
        Announcement::find()
            .order_by_desc(announcement::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new announcement.
    pub async fn create(&self, model: announcement::ActiveModel) -> AppResult<announcement::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the active flag in place.
    pub async fn toggle_active(&self, id: &str) -> AppResult<u64> {
        let result = Announcement::update_many()
            .col_expr(
                announcement::Column::IsActive,
                Expr::col(announcement::Column::IsActive).not(),
            )
            .filter(announcement::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete an announcement.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Announcement::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_announcement(id: &str, is_active: bool) -> announcement::Model {
        announcement::Model {
            id: id.to_string(),
            author_id: "admin".to_string(),
            title: "Manutenção".to_string(),
            content: "O site ficará fora do ar às 3h.".to_string(),
            is_active,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_announcement("a1", true)]])
                .into_connection(),
        );

        let repo = AnnouncementRepository::new(db);
        let active = repo.find_active(10).await.unwrap();

        assert_eq!(active.len(), 1);
        assert!(active[0].is_active);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<announcement::Model>::new()])
                .into_connection(),
        );

        let repo = AnnouncementRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AnnouncementRepository::new(db);
        assert_eq!(repo.toggle_active("a1").await.unwrap(), 1);
    }
}
