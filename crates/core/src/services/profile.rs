//! Public profiles and the points ranking.

use chrono::Utc;
use fandom_common::AppResult;
use fandom_db::{
    entities::profile,
    repositories::{PostRepository, ProfileRepository},
};
use sea_orm::{Set, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Largest ranking a client may request.
const MAX_RANKING: u64 = 100;

/// Author card shown next to posts, comments and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub points: i64,
    pub is_admin: bool,
    pub equipped_frame: Option<String>,
    pub equipped_badge: Option<String>,
    pub equipped_name_color: Option<String>,
}

impl From<&profile::Model> for ProfileSummary {
    fn from(p: &profile::Model) -> Self {
        Self {
            id: p.id.clone(),
            username: p.username.clone(),
            display_name: p.display_name.clone(),
            avatar_url: p.avatar_url.clone(),
            points: p.points,
            is_admin: p.is_admin,
            equipped_frame: p.equipped_frame.clone(),
            equipped_badge: p.equipped_badge.clone(),
            equipped_name_color: p.equipped_name_color.clone(),
        }
    }
}

/// Profile page data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[serde(flatten)]
    pub summary: ProfileSummary,
    pub bio: Option<String>,
    pub post_count: u64,
    pub created_at: DateTimeWithTimeZone,
}

/// Input for editing one's own profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 50))]
    pub display_name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Profile service.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
    post_repo: PostRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository, post_repo: PostRepository) -> Self {
        Self {
            profile_repo,
            post_repo,
        }
    }

    /// Public profile by username.
    pub async fn get_public(&self, username: &str) -> AppResult<PublicProfile> {
        let profile = self.profile_repo.get_by_username(username).await?;
        let post_count = self.post_repo.count_by_author(&profile.id).await?;

        Ok(PublicProfile {
            summary: ProfileSummary::from(&profile),
            bio: profile.bio,
            post_count,
            created_at: profile.created_at,
        })
    }

    /// Update display name, bio or avatar. A blank display name or bio clears it.
    pub async fn update(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<profile::Model> {
        input.validate()?;

        let profile = self.profile_repo.get_by_id(user_id).await?;
        let mut active: profile::ActiveModel = profile.into();

        if let Some(display_name) = input.display_name {
            active.display_name = Set(non_empty(display_name));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(non_empty(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(non_empty(avatar_url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.profile_repo.update(active).await
    }

    /// Top profiles by points.
    pub async fn ranking(&self, limit: u64) -> AppResult<Vec<ProfileSummary>> {
        let profiles = self
            .profile_repo
            .find_top_by_points(limit.clamp(1, MAX_RANKING))
            .await?;
        Ok(profiles.iter().map(ProfileSummary::from).collect())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
