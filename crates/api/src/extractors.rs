//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use fandom_common::AppError;
use fandom_db::entities::profile;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub profile::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<profile::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<profile::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<profile::Model>().cloned()))
    }
}

/// Administrator extractor: 401 without a session, 403 for non-admins.
#[derive(Debug, Clone)]
pub struct AdminUser(pub profile::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        fandom_core::require_admin(&user)?;
        Ok(Self(user))
    }
}
