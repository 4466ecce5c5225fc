//! Create profile table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profile::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Profile::Username).string_len(30).not_null())
                    .col(ColumnDef::new(Profile::UsernameLower).string_len(30).not_null())
                    .col(ColumnDef::new(Profile::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Profile::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(Profile::Token).string_len(64))
                    .col(ColumnDef::new(Profile::DisplayName).string_len(64))
                    .col(ColumnDef::new(Profile::AvatarUrl).string_len(1024))
                    .col(ColumnDef::new(Profile::Bio).text())
                    .col(ColumnDef::new(Profile::Points).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Profile::IsAdmin).boolean().not_null().default(false))
                    .col(ColumnDef::new(Profile::IsBanned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Profile::EquippedFrame).string_len(64))
                    .col(ColumnDef::new(Profile::EquippedBadge).string_len(64))
                    .col(ColumnDef::new(Profile::EquippedNameColor).string_len(64))
                    .col(ColumnDef::new(Profile::LastLoginBonusAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Profile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Profile::UpdatedAt).timestamp_with_time_zone())
                    .check(Expr::col(Profile::Points).gte(0))
                    .to_owned(),
            )
            .await?;

        // Unique index: username_lower
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_username_lower")
                    .table(Profile::Table)
                    .col(Profile::UsernameLower)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: email
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_email")
                    .table(Profile::Table)
                    .col(Profile::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: token
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_token")
                    .table(Profile::Table)
                    .col(Profile::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: points (ranking)
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_points")
                    .table(Profile::Table)
                    .col(Profile::Points)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
    Username,
    UsernameLower,
    Email,
    PasswordHash,
    Token,
    DisplayName,
    AvatarUrl,
    Bio,
    Points,
    IsAdmin,
    IsBanned,
    EquippedFrame,
    EquippedBadge,
    EquippedNameColor,
    LastLoginBonusAt,
    CreatedAt,
    UpdatedAt,
}
