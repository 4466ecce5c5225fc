//! Category request entity (a user-suggested fan group).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::fan_group::GroupType;
use super::manager_application::ReviewStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Requesting user
    pub user_id: String,

    pub name: String,

    /// Slug the group would get, used for duplicate detection
    pub slug: String,

    pub group_type: GroupType,

    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,

    pub status: ReviewStatus,

    /// Group created on approval
    #[sea_orm(nullable)]
    pub created_group_id: Option<String>,

    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub reviewed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
