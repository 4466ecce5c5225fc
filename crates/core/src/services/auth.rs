//! Account and session service.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{entities::profile, repositories::ProfileRepository};
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::services::points::PointsService;

#[allow(clippy::expect_used)]
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{3,30}$").expect("valid username regex"));

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 50))]
    pub display_name: Option<String>,
}

/// Input for signing in with a username or an email.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    #[validate(length(min = 1, max = 254))]
    pub login: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// A freshly opened session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub profile: profile::Model,
    pub token: String,
    pub bonus_granted: bool,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username");
        err.message = Some("use de 3 a 30 letras minúsculas, números ou _".into());
        Err(err)
    }
}

/// Account and session service.
#[derive(Clone)]
pub struct AuthService {
    profile_repo: ProfileRepository,
    points: PointsService,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository, points: PointsService) -> Self {
        Self {
            profile_repo,
            points,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an account and open its first session.
    pub async fn signup(&self, mut input: SignupInput) -> AppResult<Session> {
        input.username = input.username.trim().to_lowercase();
        input.email = input.email.trim().to_lowercase();
        input.validate()?;

        if self
            .profile_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("nome de usuário já está em uso".to_string()));
        }
        if self.profile_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("e-mail já cadastrado".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();

        let model = profile::ActiveModel {
            id: Set(self.id_gen.generate()),
            username_lower: Set(input.username.clone()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            display_name: Set(input
                .display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())),
            points: Set(0),
            is_admin: Set(false),
            is_banned: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let profile = self.profile_repo.create(model).await?;
        info!(user_id = %profile.id, username = %profile.username, "Account created");

        Ok(Session {
            profile,
            token,
            bonus_granted: false,
        })
    }

    /// Sign in, granting the daily bonus on the first sign-in of the day.
    pub async fn signin(&self, input: SigninInput) -> AppResult<Session> {
        input.validate()?;

        let profile = self
            .profile_repo
            .find_by_login(input.login.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &profile.password_hash)? {
            return Err(AppError::Unauthorized);
        }
        if profile.is_banned {
            return Err(AppError::Forbidden("esta conta foi suspensa".to_string()));
        }

        // Reuse the live session token so other devices stay signed in
        let token = match profile.token.clone() {
            Some(token) => token,
            None => {
                let token = self.id_gen.generate_token();
                self.profile_repo
                    .rotate_token(&profile.id, Some(token.clone()))
                    .await?;
                token
            }
        };

        let bonus_granted = match self.points.grant_daily_bonus(&profile.id).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, user_id = %profile.id, "Failed to grant daily bonus");
                false
            }
        };

        let profile = if bonus_granted {
            self.profile_repo.get_by_id(&profile.id).await?
        } else {
            profile
        };

        Ok(Session {
            profile,
            token,
            bonus_granted,
        })
    }

    /// Invalidate the user's session token.
    pub async fn signout(&self, user_id: &str) -> AppResult<()> {
        self.profile_repo
            .rotate_token(user_id, Some(self.id_gen.generate_token()))
            .await
    }

    /// Resolve a session token. Banned users resolve to `None`.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Option<profile::Model>> {
        Ok(self
            .profile_repo
            .find_by_token(token)
            .await?
            .filter(|p| !p.is_banned))
    }

    /// Delete the caller's account after re-checking the password.
    pub async fn delete_account(&self, user: &profile::Model, password: &str) -> AppResult<()> {
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Forbidden("senha incorreta".to_string()));
        }

        self.profile_repo.delete(&user.id).await?;
        info!(user_id = %user.id, "Account deleted");
        Ok(())
    }
}

/// Hash a password with argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::create_test_profile;
    use fandom_common::config::EconomyConfig;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(profile_db: MockDatabase, points_db: MockDatabase) -> AuthService {
        let points = PointsService::new(
            ProfileRepository::new(Arc::new(points_db.into_connection())),
            EconomyConfig::default(),
        );
        AuthService::new(
            ProfileRepository::new(Arc::new(profile_db.into_connection())),
            points,
        )
    }

    fn profile_with_password(id: &str, password: &str) -> profile::Model {
        let mut profile = create_test_profile(id, false);
        profile.password_hash = hash_password(password).unwrap();
        profile
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("saranghae123").unwrap();
        assert!(verify_password("saranghae123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("army_2013").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Jimin").is_err());
        assert!(validate_username("com espaço").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
    }

    #[tokio::test]
    async fn test_signup_username_taken() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_profile("blink", false)]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .signup(SignupInput {
                username: "Blink".to_string(),
                email: "blink@example.com".to_string(),
                password: "password123".to_string(),
                display_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_invalid_email() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .signup(SignupInput {
                username: "once".to_string(),
                email: "not-an-email".to_string(),
                password: "password123".to_string(),
                display_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_creates_profile() {
        let created = create_test_profile("once", false);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .append_query_results([Vec::<profile::Model>::new()])
                .append_query_results([[created]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let session = service
            .signup(SignupInput {
                username: "once".to_string(),
                email: "once@example.com".to_string(),
                password: "password123".to_string(),
                display_name: Some("ONCE".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(session.token.len(), 64);
        assert!(!session.bonus_granted);
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile_with_password("u1", "correct-horse")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .signin(SigninInput {
                login: "u1".to_string(),
                password: "battery-staple".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_signin_banned() {
        let mut banned = profile_with_password("u1", "correct-horse");
        banned.is_banned = true;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[banned]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .signin(SigninInput {
                login: "u1@example.com".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_signin_grants_daily_bonus() {
        let profile = profile_with_password("u1", "correct-horse");
        let mut credited = profile.clone();
        credited.points = 20;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .append_query_results([[credited]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]),
        );

        let session = service
            .signin(SigninInput {
                login: "u1".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();

        assert!(session.bonus_granted);
        assert_eq!(session.profile.points, 20);
        assert_eq!(session.token, "token-u1");
    }

    #[tokio::test]
    async fn test_authenticate_banned_is_anonymous() {
        let mut banned = create_test_profile("u1", false);
        banned.is_banned = true;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[banned]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        assert!(service
            .authenticate_by_token("token-u1")
            .await
            .unwrap()
            .is_none());
    }
}
