//! Fan group repository.

use std::sync::Arc;

use crate::entities::{FanGroup, fan_group};
use fan_group::GroupType;
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Fan group repository for database operations.
#[derive(Clone)]
pub struct FanGroupRepository {
    db: Arc<DatabaseConnection>,
}

impl FanGroupRepository {
    /// Create a new fan group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<fan_group::Model>> {
        FanGroup::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<fan_group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("grupo {id}")))
    }

    /// Find a group by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<fan_group::Model>> {
        FanGroup::find()
            .filter(fan_group::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<fan_group::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("grupo {slug}")))
    }

    /// Find groups by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<fan_group::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        FanGroup::find()
            .filter(fan_group::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List groups alphabetically, optionally of one type.
    pub async fn list(&self, group_type: Option<GroupType>) -> AppResult<Vec<fan_group::Model>> {
        let mut query = FanGroup::find();

        if let Some(t) = group_type {
            query = query.filter(fan_group::Column::GroupType.eq(t));
        }

        query
            .order_by_asc(fan_group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new group.
    pub async fn create(&self, model: fan_group::ActiveModel) -> AppResult<fan_group::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a group.
    pub async fn update(&self, model: fan_group::ActiveModel) -> AppResult<fan_group::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group. Its posts stay, detached from the group.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = FanGroup::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count all groups.
    pub async fn count(&self) -> AppResult<u64> {
        FanGroup::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
