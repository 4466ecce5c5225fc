//! Manager application repository.

use std::sync::Arc;

use crate::entities::{ManagerApplication, manager_application};
use chrono::Utc;
use fandom_common::{AppError, AppResult};
use manager_application::ReviewStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Manager application repository for database operations.
#[derive(Clone)]
pub struct ManagerApplicationRepository {
    db: Arc<DatabaseConnection>,
}

impl ManagerApplicationRepository {
    /// Create a new manager application repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an application by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<manager_application::Model>> {
        ManagerApplication::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an application by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<manager_application::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("candidatura {id}")))
    }

    /// Find a user's pending application for a group.
    pub async fn find_pending(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> AppResult<Option<manager_application::Model>> {
        ManagerApplication::find()
            .filter(manager_application::Column::UserId.eq(user_id))
            .filter(manager_application::Column::GroupId.eq(group_id))
            .filter(manager_application::Column::Status.eq(ReviewStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new application.
    pub async fn create(
        &self,
        model: manager_application::ActiveModel,
    ) -> AppResult<manager_application::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List applications, newest first, optionally by status.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
        limit: u64,
    ) -> AppResult<Vec<manager_application::Model>> {
        let mut query = ManagerApplication::find();
        if let Some(s) = status {
            query = query.filter(manager_application::Column::Status.eq(s));
        }

        query
            .order_by_desc(manager_application::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending application to `status`.
    ///
    /// Returns 0 when the application is missing or already reviewed.
    pub async fn review(&self, id: &str, status: ReviewStatus, reviewer_id: &str) -> AppResult<u64> {
        let result = ManagerApplication::update_many()
            .col_expr(manager_application::Column::Status, Expr::value(status))
            .col_expr(
                manager_application::Column::ReviewedBy,
                Expr::value(reviewer_id),
            )
            .col_expr(manager_application::Column::ReviewedAt, Expr::value(Utc::now()))
            .filter(manager_application::Column::Id.eq(id))
            .filter(manager_application::Column::Status.eq(ReviewStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count applications with a status.
    pub async fn count_by_status(&self, status: ReviewStatus) -> AppResult<u64> {
        ManagerApplication::find()
            .filter(manager_application::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_application(id: &str, status: ReviewStatus) -> manager_application::Model {
        manager_application::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            group_id: "g1".to_string(),
            reason: "Acompanho o grupo desde o debut".to_string(),
            status,
            reviewed_by: None,
            created_at: Utc::now().into(),
            reviewed_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_application("a1", ReviewStatus::Pending)]])
                .into_connection(),
        );

        let repo = ManagerApplicationRepository::new(db);
        let found = repo.find_pending("u1", "g1").await.unwrap();

        assert_eq!(found.unwrap().status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_application("a1", ReviewStatus::Pending),
                    create_test_application("a2", ReviewStatus::Rejected),
                ]])
                .into_connection(),
        );

        let repo = ManagerApplicationRepository::new(db);
        assert_eq!(repo.list(None, 50).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_review_already_reviewed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ManagerApplicationRepository::new(db);
        let rows = repo
            .review("a1", ReviewStatus::Approved, "admin")
            .await
            .unwrap();

        assert_eq!(rows, 0);
    }
}
