//! Fan group entity (idol group or actor category).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of fan group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    #[sea_orm(string_value = "idol")]
    Idol,
    #[sea_orm(string_value = "actor")]
    Actor,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fan_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// URL slug derived from the name
    #[sea_orm(unique)]
    pub slug: String,

    pub group_type: GroupType,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::group_moderator::Entity")]
    Moderators,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::group_moderator::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Moderators.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
