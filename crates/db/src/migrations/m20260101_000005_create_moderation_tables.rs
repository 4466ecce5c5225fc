//! Create manager_application, category_request and report tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ManagerApplication::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ManagerApplication::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ManagerApplication::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ManagerApplication::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(ManagerApplication::Reason).text().not_null())
                    .col(
                        ColumnDef::new(ManagerApplication::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ManagerApplication::ReviewedBy).string_len(32))
                    .col(
                        ColumnDef::new(ManagerApplication::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ManagerApplication::ReviewedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manager_application_user")
                            .from(ManagerApplication::Table, ManagerApplication::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manager_application_group")
                            .from(ManagerApplication::Table, ManagerApplication::GroupId)
                            .to(FanGroup::Table, FanGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, group_id, status) for the duplicate check
        manager
            .create_index(
                Index::create()
                    .name("idx_manager_application_user_group_status")
                    .table(ManagerApplication::Table)
                    .col(ManagerApplication::UserId)
                    .col(ManagerApplication::GroupId)
                    .col(ManagerApplication::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CategoryRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CategoryRequest::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(CategoryRequest::Name).string_len(80).not_null())
                    .col(ColumnDef::new(CategoryRequest::Slug).string_len(96).not_null())
                    .col(ColumnDef::new(CategoryRequest::GroupType).string_len(16).not_null())
                    .col(ColumnDef::new(CategoryRequest::Reason).text())
                    .col(
                        ColumnDef::new(CategoryRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(CategoryRequest::CreatedGroupId).string_len(32))
                    .col(ColumnDef::new(CategoryRequest::ReviewedBy).string_len(32))
                    .col(
                        ColumnDef::new(CategoryRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CategoryRequest::ReviewedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_request_user")
                            .from(CategoryRequest::Table, CategoryRequest::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_category_request_slug_status")
                    .table(CategoryRequest::Table)
                    .col(CategoryRequest::Slug)
                    .col(CategoryRequest::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Report::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Report::ReporterId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::TargetType).string_len(16).not_null())
                    .col(ColumnDef::new(Report::TargetId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Reason).text().not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Report::ResolvedBy).string_len(32))
                    .col(ColumnDef::new(Report::ResolutionNote).text())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reporter")
                            .from(Report::Table, Report::ReporterId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (admin queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status")
                    .table(Report::Table)
                    .col(Report::Status)
                    .to_owned(),
            )
            .await?;

        // Index: (target_type, target_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_target")
                    .table(Report::Table)
                    .col(Report::TargetType)
                    .col(Report::TargetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CategoryRequest::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ManagerApplication::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ManagerApplication {
    Table,
    Id,
    UserId,
    GroupId,
    Reason,
    Status,
    ReviewedBy,
    CreatedAt,
    ReviewedAt,
}

#[derive(Iden)]
enum CategoryRequest {
    Table,
    Id,
    UserId,
    Name,
    Slug,
    GroupType,
    Reason,
    Status,
    CreatedGroupId,
    ReviewedBy,
    CreatedAt,
    ReviewedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    ReporterId,
    TargetType,
    TargetId,
    Reason,
    Status,
    ResolvedBy,
    ResolutionNote,
    CreatedAt,
    ResolvedAt,
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
