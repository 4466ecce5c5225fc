//! Group moderator repository.

use std::sync::Arc;

use crate::entities::{GroupModerator, group_moderator};
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Group moderator repository for database operations.
#[derive(Clone)]
pub struct ModeratorRepository {
    db: Arc<DatabaseConnection>,
}

impl ModeratorRepository {
    /// Create a new moderator repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the moderator row for a group and user.
    pub async fn find(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<Option<group_moderator::Model>> {
        GroupModerator::find()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .filter(group_moderator::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user moderates a group.
    pub async fn is_moderator(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self.find(group_id, user_id).await?.is_some())
    }

    /// Moderators of a group, oldest assignment first.
    pub async fn find_by_group(&self, group_id: &str) -> AppResult<Vec<group_moderator::Model>> {
        GroupModerator::find()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .order_by_asc(group_moderator::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Groups a user moderates.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<group_moderator::Model>> {
        GroupModerator::find()
            .filter(group_moderator::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Assign a moderator.
    pub async fn create(
        &self,
        model: group_moderator::ActiveModel,
    ) -> AppResult<group_moderator::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a moderator assignment.
    pub async fn delete(&self, group_id: &str, user_id: &str) -> AppResult<u64> {
        let result = GroupModerator::delete_many()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .filter(group_moderator::Column::UserId.eq(user_id))
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

    fn create_test_moderator(group_id: &str, user_id: &str) -> group_moderator::Model {
        group_moderator::Model {
            id: format!("m-{group_id}-{user_id}"),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_moderator_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_moderator("g1", "u1")]])
                .into_connection(),
        );

        let repo = ModeratorRepository::new(db);
        assert!(repo.is_moderator("g1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_moderator_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group_moderator::Model>::new()])
                .into_connection(),
        );

        let repo = ModeratorRepository::new(db);
        assert!(!repo.is_moderator("g1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_group() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_moderator("g1", "u1"),
                    create_test_moderator("g1", "u2"),
                ]])
                .into_connection(),
        );

        let repo = ModeratorRepository::new(db);
        assert_eq!(repo.find_by_group("g1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_assignment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ModeratorRepository::new(db);
        assert_eq!(repo.delete("g1", "u9").await.unwrap(), 0);
    }
}
