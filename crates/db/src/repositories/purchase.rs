//! Shop purchase repository.

use std::sync::Arc;

use crate::entities::{Purchase, purchase};
use fandom_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Purchase repository for database operations.
#[derive(Clone)]
pub struct PurchaseRepository {
    db: Arc<DatabaseConnection>,
}

impl PurchaseRepository {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a purchase by user and item.
    pub async fn find_by_user_and_item(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> AppResult<Option<purchase::Model>> {
        Purchase::find()
            .filter(purchase::Column::UserId.eq(user_id))
            .filter(purchase::Column::ItemId.eq(item_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user owns an item.
    pub async fn owns(&self, user_id: &str, item_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_item(user_id, item_id)
            .await?
            .is_some())
    }

    /// Everything a user bought.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<purchase::Model>> {
        Purchase::find()
            .filter(purchase::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a purchase.
    pub async fn create(&self, model: purchase::ActiveModel) -> AppResult<purchase::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_purchase(user_id: &str, item_id: &str) -> purchase::Model {
        purchase::Model {
            id: format!("{user_id}-{item_id}"),
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            price: 200,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_owns() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_purchase("u1", "moldura_neon")]])
                .append_query_results([Vec::<purchase::Model>::new()])
                .into_connection(),
        );

        let repo = PurchaseRepository::new(db);
        assert!(repo.owns("u1", "moldura_neon").await.unwrap());
        assert!(!repo.owns("u1", "selo_bias").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_purchase("u1", "moldura_neon"),
                    create_test_purchase("u1", "nome_rosa"),
                ]])
                .into_connection(),
        );

        let repo = PurchaseRepository::new(db);
        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 2);
    }
}
