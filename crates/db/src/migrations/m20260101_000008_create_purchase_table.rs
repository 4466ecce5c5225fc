//! Create purchase table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Purchase::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Purchase::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Purchase::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Purchase::ItemId).string_len(64).not_null())
                    .col(ColumnDef::new(Purchase::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Purchase::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_user")
                            .from(Purchase::Table, Purchase::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, item_id) - an item is owned at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_user_item")
                    .table(Purchase::Table)
                    .col(Purchase::UserId)
                    .col(Purchase::ItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Purchase::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Purchase {
    Table,
    Id,
    UserId,
    ItemId,
    Price,
    CreatedAt,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}
