//! Announcement entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Site-wide notice shown in every inbox while active.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "announcement")]
pub struct Model {
    /// Unique announcement ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Admin who published it.
    pub author_id: String,

    /// Title of the announcement.
    pub title: String,

    /// Body of the announcement.
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Whether the announcement is currently delivered.
    pub is_active: bool,

    /// When the announcement was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::AuthorId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
