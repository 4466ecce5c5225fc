//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_profile_table;
mod m20260101_000002_create_fan_group_tables;
mod m20260101_000003_create_post_table;
mod m20260101_000004_create_comment_and_like_tables;
mod m20260101_000005_create_moderation_tables;
mod m20260101_000006_create_notification_table;
mod m20260101_000007_create_messaging_tables;
mod m20260101_000008_create_purchase_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_profile_table::Migration),
            Box::new(m20260101_000002_create_fan_group_tables::Migration),
            Box::new(m20260101_000003_create_post_table::Migration),
            Box::new(m20260101_000004_create_comment_and_like_tables::Migration),
            Box::new(m20260101_000005_create_moderation_tables::Migration),
            Box::new(m20260101_000006_create_notification_table::Migration),
            Box::new(m20260101_000007_create_messaging_tables::Migration),
            Box::new(m20260101_000008_create_purchase_table::Migration),
        ]
    }
}
