//! Model builders for service tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use fandom_db::entities::{comment, fan_group, fan_group::GroupType, post, profile};
use sea_orm::DatabaseConnection;

/// Number of `"points" = "points" + amount` updates a mock connection executed.
///
/// Every service holding the connection must be dropped first.
#[allow(clippy::expect_used)]
pub fn point_credits(conn: Arc<DatabaseConnection>, amount: i64) -> usize {
    let log = Arc::try_unwrap(conn)
        .expect("connection still shared")
        .into_transaction_log();
    let value = format!("BigInt(Some({amount}))");
    log.iter()
        .map(|t| format!("{t:?}"))
        .filter(|t| t.contains("UPDATE") && t.contains("+ $1") && t.contains(&value))
        .count()
}

pub fn create_test_profile(id: &str, is_admin: bool) -> profile::Model {
    profile::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_lowercase(),
        email: format!("{id}@example.com"),
        password_hash: String::new(),
        token: Some(format!("token-{id}")),
        display_name: None,
        avatar_url: None,
        bio: None,
        points: 0,
        is_admin,
        is_banned: false,
        equipped_frame: None,
        equipped_badge: None,
        equipped_name_color: None,
        last_login_bonus_at: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn create_test_post(id: &str, author_id: &str, group_id: Option<&str>) -> post::Model {
    post::Model {
        id: id.to_string(),
        author_id: author_id.to_string(),
        group_id: group_id.map(ToString::to_string),
        title: "Comeback confirmado!".to_string(),
        content: "O grupo volta em novembro.".to_string(),
        image_url: None,
        source_url: None,
        is_news: false,
        is_pinned: false,
        is_hidden: false,
        views_count: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn create_test_comment(id: &str, post_id: &str, author_id: &str) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        content: "Que notícia incrível!".to_string(),
        is_hidden: false,
        created_at: Utc::now().into(),
    }
}

pub fn create_test_group(id: &str, slug: &str) -> fan_group::Model {
    fan_group::Model {
        id: id.to_string(),
        name: slug.to_uppercase(),
        slug: slug.to_string(),
        group_type: GroupType::Idol,
        description: None,
        image_url: None,
        created_at: Utc::now().into(),
    }
}
