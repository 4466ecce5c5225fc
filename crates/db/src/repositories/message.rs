//! Direct message repository.

use std::sync::Arc;

use crate::entities::{Message, message};
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages addressed to a user, newest first.
    pub async fn find_inbox(&self, user_id: &str, limit: u64) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::RecipientId.eq(user_id))
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages sent by a user, newest first.
    pub async fn find_sent(&self, user_id: &str, limit: u64) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::SenderId.eq(user_id))
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unread messages for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::RecipientId.eq(user_id))
            .filter(message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a message as read by its recipient.
    ///
    /// Returns 0 when the message is not addressed to `recipient_id`.
    pub async fn mark_as_read(&self, id: &str, recipient_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(message::Column::IsRead, true.into())
            .filter(message::Column::Id.eq(id))
            .filter(message::Column::RecipientId.eq(recipient_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
