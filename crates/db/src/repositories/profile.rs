//! Profile repository.
//!
//! Balance changes are single conditional `UPDATE` statements; callers read
//! `rows_affected` to learn whether the guard held.

use std::sync::Arc;

use crate::entities::{Profile, profile};
use chrono::{DateTime, Utc};
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("perfil {id}")))
    }

    /// Find profiles by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<profile::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Profile::find()
            .filter(profile::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by username, returning an error if not found.
    pub async fn get_by_username(&self, username: &str) -> AppResult<profile::Model> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("usuário @{username}")))
    }

    /// Find a profile by email (stored lowercase).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by username or email.
    pub async fn find_by_login(&self, login: &str) -> AppResult<Option<profile::Model>> {
        let login = login.trim().to_lowercase();
        Profile::find()
            .filter(
                Condition::any()
                    .add(profile::Column::UsernameLower.eq(login.clone()))
                    .add(profile::Column::Email.eq(login)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by session token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new profile.
    pub async fn create(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a profile.
    pub async fn update(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hard-delete a profile. Owned rows go with it through cascading keys.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Profile::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Credit points (single UPDATE query, no fetch).
    pub async fn add_points(&self, id: &str, amount: i64) -> AppResult<u64> {
        let result = Profile::update_many()
            .col_expr(
                profile::Column::Points,
                Expr::col(profile::Column::Points).add(amount),
            )
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Debit points only when the balance covers the amount.
    ///
    /// Returns 0 when the profile is missing or the balance is too low.
    pub async fn spend_points(&self, id: &str, amount: i64) -> AppResult<u64> {
        let result = Profile::update_many()
            .col_expr(
                profile::Column::Points,
                Expr::col(profile::Column::Points).sub(amount),
            )
            .filter(profile::Column::Id.eq(id))
            .filter(profile::Column::Points.gte(amount))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Credit the daily bonus unless it was already credited since `day_start`.
    pub async fn grant_daily_bonus(
        &self,
        id: &str,
        amount: i64,
        now: DateTime<Utc>,
        day_start: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = Profile::update_many()
            .col_expr(
                profile::Column::Points,
                Expr::col(profile::Column::Points).add(amount),
            )
            .col_expr(profile::Column::LastLoginBonusAt, Expr::value(now))
            .filter(profile::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(profile::Column::LastLoginBonusAt.is_null())
                    .add(profile::Column::LastLoginBonusAt.lt(day_start)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Write one cosmetic slot column.
    pub async fn set_cosmetic(
        &self,
        id: &str,
        column: profile::Column,
        item_id: Option<&str>,
    ) -> AppResult<u64> {
        let result = Profile::update_many()
            .col_expr(column, Expr::value(item_id.map(ToString::to_string)))
            .col_expr(profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Replace the session token, invalidating the previous one.
    pub async fn rotate_token(&self, id: &str, token: Option<String>) -> AppResult<()> {
        Profile::update_many()
            .col_expr(profile::Column::Token, Expr::value(token))
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the banned flag. Banning also drops the session token.
    pub async fn set_banned(&self, id: &str, banned: bool) -> AppResult<u64> {
        let mut update = Profile::update_many()
            .col_expr(profile::Column::IsBanned, Expr::value(banned))
            .col_expr(profile::Column::UpdatedAt, Expr::value(Utc::now()));
        if banned {
            update = update.col_expr(profile::Column::Token, Expr::value(Option::<String>::None));
        }
        let result = update
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Set the admin flag.
    pub async fn set_admin(&self, id: &str, is_admin: bool) -> AppResult<u64> {
        let result = Profile::update_many()
            .col_expr(profile::Column::IsAdmin, Expr::value(is_admin))
            .col_expr(profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Top profiles by points, banned profiles excluded.
    pub async fn find_top_by_points(&self, limit: u64) -> AppResult<Vec<profile::Model>> {
        Profile::find()
            .filter(profile::Column::IsBanned.eq(false))
            .order_by_desc(profile::Column::Points)
            .order_by_asc(profile::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search profiles by username, display name or email (admin listing).
    pub async fn search(
        &self,
        query: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<profile::Model>> {
        let mut select = Profile::find();

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!(
                "%{}%",
                q.to_lowercase().replace('%', "\\%").replace('_', "\\_")
            );
            select = select.filter(
                Condition::any()
                    .add(profile::Column::UsernameLower.like(pattern.clone()))
                    .add(profile::Column::Email.like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(profile::Column::DisplayName))).like(pattern)),
            );
        }

        select
            .order_by_desc(profile::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all profiles.
    pub async fn count(&self) -> AppResult<u64> {
        Profile::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_profile(id: &str, username: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            token: Some("test_token".to_string()),
            display_name: None,
            avatar_url: None,
            bio: None,
            points: 100,
            is_admin: false,
            is_banned: false,
            equipped_frame: None,
            equipped_badge: None,
            equipped_name_color: None,
            last_login_bonus_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let profile = create_test_profile("p1", "minji");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_id("p1").await.unwrap();

        assert_eq!(result.unwrap().username, "minji");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_login_matches_email() {
        let profile = create_test_profile("p1", "hanni");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_login(" Hanni@Example.com ").await.unwrap();

        assert_eq!(result.unwrap().id, "p1");
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_create_profile() {
        let profile = create_test_profile("p1", "danielle");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let active = profile::ActiveModel {
            id: Set("p1".to_string()),
            username: Set("danielle".to_string()),
            username_lower: Set("danielle".to_string()),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.username, "danielle");
    }

    #[tokio::test]
    async fn test_spend_points_reports_guard_failure() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let rows = repo.spend_points("p1", 500).await.unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_add_points() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert_eq!(repo.add_points("p1", 10).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_grant_daily_bonus_already_granted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let now = Utc::now();
        let rows = repo.grant_daily_bonus("p1", 20, now, now).await.unwrap();

        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_find_top_by_points() {
        let mut first = create_test_profile("p1", "first");
        first.points = 900;
        let second = create_test_profile("p2", "second");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[first, second]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.find_top_by_points(10).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].points, 900);
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(42))
                }]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert_eq!(repo.count().await.unwrap(), 42);
    }
}
