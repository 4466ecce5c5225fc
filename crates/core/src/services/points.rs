//! Points bookkeeping.
//!
//! Every balance change is one conditional `UPDATE`; nothing reads the
//! balance and writes it back.

use chrono::{DateTime, NaiveTime, Utc};
use fandom_common::{AppError, AppResult, config::EconomyConfig};
use fandom_db::repositories::ProfileRepository;
use tracing::{info, warn};

/// Points service.
#[derive(Clone)]
pub struct PointsService {
    profile_repo: ProfileRepository,
    economy: EconomyConfig,
}

impl PointsService {
    /// Create a new points service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository, economy: EconomyConfig) -> Self {
        Self {
            profile_repo,
            economy,
        }
    }

    /// Configured economy values.
    #[must_use]
    pub const fn economy(&self) -> &EconomyConfig {
        &self.economy
    }

    /// Credit points to a user.
    pub async fn reward(&self, user_id: &str, amount: i64) -> AppResult<()> {
        if amount <= 0 {
            return Ok(());
        }
        let updated = self.profile_repo.add_points(user_id, amount).await?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("usuário {user_id}")));
        }
        Ok(())
    }

    /// Credit points after a write that already succeeded; failures are logged.
    pub async fn reward_best_effort(&self, user_id: &str, amount: i64, reason: &str) {
        if let Err(e) = self.reward(user_id, amount).await {
            warn!(error = %e, user_id = %user_id, amount, reason, "Failed to credit points");
        }
    }

    /// Debit points, failing with `InsufficientPoints` when the balance is short.
    pub async fn spend(&self, user_id: &str, amount: i64) -> AppResult<()> {
        if amount <= 0 {
            return Ok(());
        }
        let updated = self.profile_repo.spend_points(user_id, amount).await?;
        if updated == 0 {
            return Err(AppError::InsufficientPoints { required: amount });
        }
        Ok(())
    }

    /// Give back points debited for a write that then failed.
    pub async fn refund(&self, user_id: &str, amount: i64) {
        if amount <= 0 {
            return;
        }
        match self.profile_repo.add_points(user_id, amount).await {
            Ok(_) => info!(user_id = %user_id, amount, "Refunded points"),
            Err(e) => warn!(error = %e, user_id = %user_id, amount, "Failed to refund points"),
        }
    }

    /// Credit the daily sign-in bonus once per UTC day. Returns whether it was granted.
    pub async fn grant_daily_bonus(&self, user_id: &str) -> AppResult<bool> {
        let now = Utc::now();
        let updated = self
            .profile_repo
            .grant_daily_bonus(
                user_id,
                self.economy.daily_login_bonus,
                now,
                start_of_utc_day(now),
            )
            .await?;
        Ok(updated > 0)
    }

    /// Signed admin adjustment. A debit never takes the balance below zero.
    pub async fn adjust(&self, user_id: &str, delta: i64) -> AppResult<()> {
        match delta {
            0 => Err(AppError::BadRequest("o ajuste não pode ser zero".to_string())),
            d if d > 0 => self.reward(user_id, d).await,
            d => self.spend(user_id, d.saturating_neg()).await,
        }
    }
}

/// Midnight UTC of the day containing `now`.
#[must_use]
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
