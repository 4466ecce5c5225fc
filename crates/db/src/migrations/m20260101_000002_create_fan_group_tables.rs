//! Create fan_group and group_moderator tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FanGroup::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FanGroup::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(FanGroup::Name).string_len(80).not_null())
                    .col(ColumnDef::new(FanGroup::Slug).string_len(96).not_null())
                    .col(ColumnDef::new(FanGroup::GroupType).string_len(16).not_null())
                    .col(ColumnDef::new(FanGroup::Description).text())
                    .col(ColumnDef::new(FanGroup::ImageUrl).string_len(1024))
                    .col(
                        ColumnDef::new(FanGroup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fan_group_slug")
                    .table(FanGroup::Table)
                    .col(FanGroup::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupModerator::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupModerator::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupModerator::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupModerator::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GroupModerator::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_moderator_group")
                            .from(GroupModerator::Table, GroupModerator::GroupId)
                            .to(FanGroup::Table, FanGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_moderator_user")
                            .from(GroupModerator::Table, GroupModerator::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_moderator_group_user")
                    .table(GroupModerator::Table)
                    .col(GroupModerator::GroupId)
                    .col(GroupModerator::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (groups a user moderates)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_moderator_user_id")
                    .table(GroupModerator::Table)
                    .col(GroupModerator::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupModerator::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FanGroup::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FanGroup {
    Table,
    Id,
    Name,
    Slug,
    GroupType,
    Description,
    ImageUrl,
    CreatedAt,
}

#[derive(Iden)]
enum GroupModerator {
    Table,
    Id,
    GroupId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}
