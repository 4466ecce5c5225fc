//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Post::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::GroupId).string_len(32))
                    .col(ColumnDef::new(Post::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Post::SourceUrl).string_len(2048))
                    .col(ColumnDef::new(Post::IsNews).boolean().not_null().default(false))
                    .col(ColumnDef::new(Post::IsPinned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Post::IsHidden).boolean().not_null().default(false))
                    .col(ColumnDef::new(Post::ViewsCount).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_group")
                            .from(Post::Table, Post::GroupId)
                            .to(FanGroup::Table, FanGroup::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (profile page)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_author_id")
                    .table(Post::Table)
                    .col(Post::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: (group_id, is_pinned, created_at) for group feeds
        manager
            .create_index(
                Index::create()
                    .name("idx_post_group_feed")
                    .table(Post::Table)
                    .col(Post::GroupId)
                    .col(Post::IsPinned)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (community feed)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_created_at")
                    .table(Post::Table)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: source_url (news de-duplication)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_source_url")
                    .table(Post::Table)
                    .col(Post::SourceUrl)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    AuthorId,
    GroupId,
    Title,
    Content,
    ImageUrl,
    SourceUrl,
    IsNews,
    IsPinned,
    IsHidden,
    ViewsCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}

#[derive(Iden)]
enum FanGroup {
    Table,
    Id,
}
