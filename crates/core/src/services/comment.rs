//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{comment, notification::NotificationKind, profile},
    repositories::{CommentRepository, PostRepository, ProfileRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::{
    notification::{NewNotification, NotificationService},
    permission::PermissionService,
    points::PointsService,
    profile::ProfileSummary,
};

/// Input for commenting on a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Comment with its author card.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: Option<ProfileSummary>,
}

/// Pair comments with their authors using one batch lookup.
pub async fn attach_authors(
    profile_repo: &ProfileRepository,
    comments: Vec<comment::Model>,
) -> AppResult<Vec<CommentView>> {
    if comments.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
    ids.sort();
    ids.dedup();

    let authors: HashMap<String, ProfileSummary> = profile_repo
        .find_by_ids(&ids)
        .await?
        .iter()
        .map(|p| (p.id.clone(), ProfileSummary::from(p)))
        .collect();

    Ok(comments
        .into_iter()
        .map(|comment| CommentView {
            author: authors.get(&comment.author_id).cloned(),
            comment,
        })
        .collect())
}

/// Comment service.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    profile_repo: ProfileRepository,
    permissions: PermissionService,
    points: PointsService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        profile_repo: ProfileRepository,
        permissions: PermissionService,
        points: PointsService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            profile_repo,
            permissions,
            points,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a visible post, rewarding the author and notifying the post's author.
    pub async fn create(
        &self,
        author: &profile::Model,
        post_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<CommentView> {
        input.validate()?;
        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::BadRequest("o comentário está vazio".to_string()));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        if post.is_hidden {
            return Err(AppError::NotFound(format!("post {post_id}")));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(author.id.clone()),
            content: Set(content),
            is_hidden: Set(false),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, post_id = %post.id, "Comment created");

        self.points
            .reward_best_effort(&author.id, self.points.economy().comment_reward, "comment")
            .await;

        self.notifications
            .notify(
                NewNotification::new(&post.author_id, NotificationKind::Comment)
                    .actor(&author.id)
                    .post(&post.id),
            )
            .await;

        Ok(CommentView {
            comment,
            author: Some(ProfileSummary::from(author)),
        })
    }

    /// Visible comments of a post, oldest first.
    pub async fn list(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        attach_authors(&self.profile_repo, comments).await
    }

    /// Delete a comment as its author, a moderator of the post's group, or an admin.
    pub async fn delete(&self, user: &profile::Model, comment_id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        let group_id = self
            .post_repo
            .find_by_id(&comment.post_id)
            .await?
            .and_then(|p| p.group_id);

        self.permissions
            .require_content_authority(user, &comment.author_id, group_id.as_deref())
            .await?;

        self.comment_repo.delete(comment_id).await?;
        info!(comment_id = %comment_id, user_id = %user.id, "Comment deleted");
        Ok(comment)
    }

    /// Whether a comment exists, hidden or not.
    pub async fn exists(&self, comment_id: &str) -> AppResult<bool> {
        Ok(self.comment_repo.find_by_id(comment_id).await?.is_some())
    }

    /// Soft-hide or reveal a comment.
    pub async fn set_hidden(&self, comment_id: &str, hidden: bool) -> AppResult<()> {
        let updated = self.comment_repo.set_hidden(comment_id, hidden).await?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("comentário {comment_id}")));
        }
        Ok(())
    }
}
