//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, UpdateResult,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get notifications for a user, newest first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find().filter(notification::Column::UserId.eq(user_id));

        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one of the user's notifications as read.
    ///
    /// Returns 0 when the notification does not belong to the user.
    pub async fn mark_as_read(&self, id: &str, user_id: &str) -> AppResult<u64> {
        let result: UpdateResult = Notification::update_many()
            .col_expr(notification::Column::IsRead, true.into())
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        let result: UpdateResult = Notification::update_many()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use notification::NotificationKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: &str, user_id: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            actor_id: Some("actor".to_string()),
            kind: NotificationKind::Like,
            post_id: Some("p1".to_string()),
            message: None,
            is_read,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_unread_only() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification("n1", "u1", false)]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.find_by_user("u1", true, 20).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(!result[0].is_read);
    }

    #[tokio::test]
    async fn test_mark_as_read_other_owner() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.mark_as_read("n1", "intruder").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_as_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.mark_all_as_read("u1").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_count_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5))
                }]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.count_unread("u1").await.unwrap(), 5);
    }
}
