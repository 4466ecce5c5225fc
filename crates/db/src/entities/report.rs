//! Report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a report points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "profile")]
    Profile,
}

/// Report status.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

/// Report model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The user who submitted the report.
    pub reporter_id: String,
    /// Kind of the reported item.
    pub target_type: ReportTarget,
    /// ID of the reported post, comment or profile.
    pub target_id: String,
    /// Reason given by the reporter.
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    /// Current status.
    pub status: ReportStatus,
    /// Admin who handled the report.
    #[sea_orm(nullable)]
    pub resolved_by: Option<String>,
    /// Note left by the admin.
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_note: Option<String>,
    /// When the report was created.
    pub created_at: DateTimeWithTimeZone,
    /// When the report left the pending state.
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ReporterId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
