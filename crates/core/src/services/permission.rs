//! Authorization checks shared by every mutation.
//!
//! A caller acts on content through one of three authorities: as a site
//! admin, as the content's author, or as a moderator of the group the
//! content belongs to. Checks re-query `group_moderator` on each call.

use fandom_common::{AppError, AppResult};
use fandom_db::{entities::profile, repositories::ModeratorRepository};
use serde::Serialize;

/// The role a caller acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    Admin,
    Author,
    GroupModerator,
}

/// Permission service.
#[derive(Clone)]
pub struct PermissionService {
    moderator_repo: ModeratorRepository,
}

impl PermissionService {
    /// Create a new permission service.
    #[must_use]
    pub const fn new(moderator_repo: ModeratorRepository) -> Self {
        Self { moderator_repo }
    }

    /// Whether the user moderates the group.
    pub async fn is_group_moderator(&self, user_id: &str, group_id: &str) -> AppResult<bool> {
        self.moderator_repo.is_moderator(group_id, user_id).await
    }

    /// Authority over a piece of content: admin, then author, then moderator.
    pub async fn content_authority(
        &self,
        user: &profile::Model,
        author_id: &str,
        group_id: Option<&str>,
    ) -> AppResult<Option<Authority>> {
        if user.is_admin {
            return Ok(Some(Authority::Admin));
        }
        if user.id == author_id {
            return Ok(Some(Authority::Author));
        }
        self.group_moderator_authority(user, group_id).await
    }

    /// Authority to pin or hide within a group. Ungrouped content is admin-only.
    pub async fn moderation_authority(
        &self,
        user: &profile::Model,
        group_id: Option<&str>,
    ) -> AppResult<Option<Authority>> {
        if user.is_admin {
            return Ok(Some(Authority::Admin));
        }
        self.group_moderator_authority(user, group_id).await
    }

    /// Like [`Self::content_authority`], failing with `Forbidden`.
    pub async fn require_content_authority(
        &self,
        user: &profile::Model,
        author_id: &str,
        group_id: Option<&str>,
    ) -> AppResult<Authority> {
        self.content_authority(user, author_id, group_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("você não tem permissão para alterar este conteúdo".to_string())
            })
    }

    /// Like [`Self::moderation_authority`], failing with `Forbidden`.
    pub async fn require_moderation_authority(
        &self,
        user: &profile::Model,
        group_id: Option<&str>,
    ) -> AppResult<Authority> {
        self.moderation_authority(user, group_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("apenas gerentes do grupo ou administradores".to_string())
            })
    }

    async fn group_moderator_authority(
        &self,
        user: &profile::Model,
        group_id: Option<&str>,
    ) -> AppResult<Option<Authority>> {
        let Some(group_id) = group_id else {
            return Ok(None);
        };
        if self.is_group_moderator(&user.id, group_id).await? {
            Ok(Some(Authority::GroupModerator))
        } else {
            Ok(None)
        }
    }
}

/// Fail with `Forbidden` unless the user is an admin.
pub fn require_admin(user: &profile::Model) -> AppResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("apenas administradores".to_string()))
    }
}
