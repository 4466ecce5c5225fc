//! Fan group (idol / actor category) service.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{fan_group, fan_group::GroupType, group_moderator},
    repositories::{FanGroupRepository, ModeratorRepository, ProfileRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::profile::ProfileSummary;

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[validate(length(min = 2, max = 80))]
    pub name: String,

    pub group_type: GroupType,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Input for editing a group. The slug never changes.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupInput {
    #[validate(length(min = 2, max = 80))]
    pub name: Option<String>,

    pub group_type: Option<GroupType>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Group with its moderators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    pub group: fan_group::Model,
    pub moderators: Vec<ProfileSummary>,
}

/// Group service.
#[derive(Clone)]
pub struct GroupService {
    group_repo: FanGroupRepository,
    moderator_repo: ModeratorRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(
        group_repo: FanGroupRepository,
        moderator_repo: ModeratorRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            group_repo,
            moderator_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List groups, optionally of one type, by name.
    pub async fn list(&self, group_type: Option<GroupType>) -> AppResult<Vec<fan_group::Model>> {
        self.group_repo.list(group_type).await
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<fan_group::Model> {
        self.group_repo.get_by_slug(slug).await
    }

    /// Group by slug together with its moderators.
    pub async fn detail(&self, slug: &str) -> AppResult<GroupDetail> {
        let group = self.group_repo.get_by_slug(slug).await?;
        let moderators = self.moderators(&group.id).await?;
        Ok(GroupDetail { group, moderators })
    }

    /// Moderator profiles of a group.
    pub async fn moderators(&self, group_id: &str) -> AppResult<Vec<ProfileSummary>> {
        let rows = self.moderator_repo.find_by_group(group_id).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = rows.into_iter().map(|m| m.user_id).collect();
        let profiles = self.profile_repo.find_by_ids(&ids).await?;
        Ok(profiles.iter().map(ProfileSummary::from).collect())
    }

    /// Create a group; the slug is derived from the name.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<fan_group::Model> {
        input.validate()?;

        let name = input.name.trim().to_string();
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "o nome precisa conter letras ou números".to_string(),
            ));
        }
        if self.group_repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!("já existe um grupo \"{slug}\"")));
        }

        let model = fan_group::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            slug: Set(slug),
            group_type: Set(input.group_type),
            description: Set(input.description),
            image_url: Set(input.image_url),
            created_at: Set(Utc::now().into()),
        };

        let group = self.group_repo.create(model).await?;
        info!(group_id = %group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    /// Edit a group.
    pub async fn update(&self, id: &str, input: UpdateGroupInput) -> AppResult<fan_group::Model> {
        input.validate()?;

        let group = self.group_repo.get_by_id(id).await?;
        let mut active: fan_group::ActiveModel = group.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(group_type) = input.group_type {
            active.group_type = Set(group_type);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description).filter(|d| !d.trim().is_empty()));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }

        self.group_repo.update(active).await
    }

    /// Delete a group. Its posts become ungrouped.
    pub async fn delete(&self, id: &str) -> AppResult<fan_group::Model> {
        let group = self.group_repo.get_by_id(id).await?;
        self.group_repo.delete(id).await?;
        info!(group_id = %id, slug = %group.slug, "Group deleted");
        Ok(group)
    }

    /// Grant moderation if absent, revoke it otherwise. Returns the new state.
    pub async fn toggle_moderator(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        self.group_repo.get_by_id(group_id).await?;
        self.profile_repo.get_by_id(user_id).await?;

        if self.moderator_repo.find(group_id, user_id).await?.is_some() {
            self.moderator_repo.delete(group_id, user_id).await?;
            info!(group_id = %group_id, user_id = %user_id, "Moderator removed");
            Ok(false)
        } else {
            self.add_moderator(group_id, user_id).await?;
            Ok(true)
        }
    }

    /// Make a user a moderator of a group unless they already are.
    pub async fn add_moderator(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        if self.moderator_repo.find(group_id, user_id).await?.is_some() {
            return Ok(());
        }

        let model = group_moderator::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        self.moderator_repo.create(model).await?;
        info!(group_id = %group_id, user_id = %user_id, "Moderator added");
        Ok(())
    }
}

/// Build a URL slug: lowercase ASCII, Portuguese accents folded, other
/// characters collapsed into single dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{create_test_group, create_test_profile};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(group_db: MockDatabase, mod_db: MockDatabase, profile_db: MockDatabase) -> GroupService {
        GroupService::new(
            FanGroupRepository::new(Arc::new(group_db.into_connection())),
            ModeratorRepository::new(Arc::new(mod_db.into_connection())),
            ProfileRepository::new(Arc::new(profile_db.into_connection())),
        )
    }

    fn moderator_row(group_id: &str, user_id: &str) -> group_moderator::Model {
        group_moderator::Model {
            id: "gm1".to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("BTS"), "bts");
        assert_eq!(slugify("Girls' Generation"), "girls-generation");
        assert_eq!(slugify("  Song Hye-kyo  "), "song-hye-kyo");
        assert_eq!(slugify("Atores Coreanos: Ação & Romance"), "atores-coreanos-acao-romance");
        assert_eq!(slugify("(G)I-DLE"), "g-i-dle");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn test_create_duplicate_slug() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "twice")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .create(CreateGroupInput {
                name: "TWICE".to_string(),
                group_type: GroupType::Idol,
                description: None,
                image_url: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_unsluggable_name() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .create(CreateGroupInput {
                name: "★★".to_string(),
                group_type: GroupType::Idol,
                description: None,
                image_url: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_toggle_moderator_revokes() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "bts")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[moderator_row("g1", "u1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_profile("u1", false)]]),
        );

        assert!(!service.toggle_moderator("g1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_moderator_grants() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "bts")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group_moderator::Model>::new()])
                .append_query_results([Vec::<group_moderator::Model>::new()])
                .append_query_results([[moderator_row("g1", "u1")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_profile("u1", false)]]),
        );

        assert!(service.toggle_moderator("g1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_detail_without_moderators() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "blackpink")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group_moderator::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let detail = service.detail("blackpink").await.unwrap();
        assert_eq!(detail.group.slug, "blackpink");
        assert!(detail.moderators.is_empty());
    }
}
