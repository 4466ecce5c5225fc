//! Report repository.

use std::sync::Arc;

use crate::entities::{Report, report};
use chrono::{DateTime, Utc};
use fandom_common::{AppError, AppResult};
use report::ReportStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("denúncia {id}")))
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports, newest first, optionally by status.
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find();
        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }

        query
            .order_by_desc(report::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Close a pending report.
    ///
    /// Returns 0 when the report is missing or no longer pending.
    pub async fn close(
        &self,
        id: &str,
        status: ReportStatus,
        resolver_id: &str,
        note: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(status))
            .col_expr(report::Column::ResolvedBy, Expr::value(resolver_id))
            .col_expr(
                report::Column::ResolutionNote,
                Expr::value(note.map(ToString::to_string)),
            )
            .col_expr(report::Column::ResolvedAt, Expr::value(resolved_at))
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count reports with a status.
    pub async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
