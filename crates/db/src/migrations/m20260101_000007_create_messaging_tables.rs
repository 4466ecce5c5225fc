//! Create message and announcement tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Message::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Message::SenderId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::RecipientId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::Content).text().not_null())
                    .col(ColumnDef::new(Message::IsRead).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_sender")
                            .from(Message::Table, Message::SenderId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_recipient")
                            .from(Message::Table, Message::RecipientId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (recipient_id, created_at) for the inbox
        manager
            .create_index(
                Index::create()
                    .name("idx_message_recipient_created")
                    .table(Message::Table)
                    .col(Message::RecipientId)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: sender_id (sent box)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_sender_id")
                    .table(Message::Table)
                    .col(Message::SenderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Announcement::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Announcement::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Announcement::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Announcement::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Announcement::Content).text().not_null())
                    .col(
                        ColumnDef::new(Announcement::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Announcement::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_announcement_author")
                            .from(Announcement::Table, Announcement::AuthorId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: is_active (inbox delivery)
        manager
            .create_index(
                Index::create()
                    .name("idx_announcement_is_active")
                    .table(Announcement::Table)
                    .col(Announcement::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Announcement::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    SenderId,
    RecipientId,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum Announcement {
    Table,
    Id,
    AuthorId,
    Title,
    Content,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}
