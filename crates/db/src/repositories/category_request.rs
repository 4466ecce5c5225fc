//! Category request repository.

use std::sync::Arc;

use crate::entities::{CategoryRequest, category_request, manager_application::ReviewStatus};
use chrono::Utc;
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Category request repository for database operations.
#[derive(Clone)]
pub struct CategoryRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRequestRepository {
    /// Create a new category request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category_request::Model>> {
        CategoryRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<category_request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pedido de categoria {id}")))
    }

    /// Find a pending request for the same slug.
    pub async fn find_pending_by_slug(
        &self,
        slug: &str,
    ) -> AppResult<Option<category_request::Model>> {
        CategoryRequest::find()
            .filter(category_request::Column::Slug.eq(slug))
            .filter(category_request::Column::Status.eq(ReviewStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new request.
    pub async fn create(
        &self,
        model: category_request::ActiveModel,
    ) -> AppResult<category_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List requests, newest first, optionally by status.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
        limit: u64,
    ) -> AppResult<Vec<category_request::Model>> {
        let mut query = CategoryRequest::find();
        if let Some(s) = status {
            query = query.filter(category_request::Column::Status.eq(s));
        }

        query
            .order_by_desc(category_request::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending request to `status`, recording the created group.
    ///
    /// Returns 0 when the request is missing or already reviewed.
    pub async fn review(
        &self,
        id: &str,
        status: ReviewStatus,
        reviewer_id: &str,
        created_group_id: Option<&str>,
    ) -> AppResult<u64> {
        let result = CategoryRequest::update_many()
            .col_expr(category_request::Column::Status, Expr::value(status))
            .col_expr(category_request::Column::ReviewedBy, Expr::value(reviewer_id))
            .col_expr(category_request::Column::ReviewedAt, Expr::value(Utc::now()))
            .col_expr(
                category_request::Column::CreatedGroupId,
                Expr::value(created_group_id.map(ToString::to_string)),
            )
            .filter(category_request::Column::Id.eq(id))
            .filter(category_request::Column::Status.eq(ReviewStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count requests with a status.
    pub async fn count_by_status(&self, status: ReviewStatus) -> AppResult<u64> {
        CategoryRequest::find()
            .filter(category_request::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::fan_group::GroupType;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_request(id: &str, slug: &str) -> category_request::Model {
        category_request::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: "Stray Kids".to_string(),
            slug: slug.to_string(),
            group_type: GroupType::Idol,
            reason: None,
            status: ReviewStatus::Pending,
            created_group_id: None,
            reviewed_by: None,
            created_at: Utc::now().into(),
            reviewed_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_pending_by_slug() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("r1", "stray-kids")]])
                .into_connection(),
        );

        let repo = CategoryRequestRepository::new(db);
        let found = repo.find_pending_by_slug("stray-kids").await.unwrap();

        assert_eq!(found.unwrap().id, "r1");
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = CategoryRequestRepository::new(db);
        assert_eq!(
            repo.count_by_status(ReviewStatus::Pending).await.unwrap(),
            2
        );
    }
}
