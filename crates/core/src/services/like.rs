//! Post like service.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{notification::NotificationKind, post_like},
    repositories::{PostLikeRepository, PostRepository},
};
use sea_orm::Set;
use serde::Serialize;

use crate::services::notification::{NewNotification, NotificationService};

/// State after toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

/// Like service.
#[derive(Clone)]
pub struct LikeService {
    like_repo: PostLikeRepository,
    post_repo: PostRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: PostLikeRepository,
        post_repo: PostRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            like_repo,
            post_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like the post, or remove the like if the user already liked it.
    pub async fn toggle(&self, user_id: &str, post_id: &str) -> AppResult<LikeState> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.is_hidden {
            return Err(AppError::NotFound(format!("post {post_id}")));
        }

        let removed = self
            .like_repo
            .delete_by_user_and_post(user_id, post_id)
            .await?;

        let liked = if removed > 0 {
            false
        } else {
            let model = post_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                post_id: Set(post_id.to_string()),
                created_at: Set(Utc::now().into()),
            };
            self.like_repo.create(model).await?;

            self.notifications
                .notify(
                    NewNotification::new(&post.author_id, NotificationKind::Like)
                        .actor(user_id)
                        .post(post_id),
                )
                .await;
            true
        };

        let like_count = self.like_repo.count_by_post(post_id).await?;
        Ok(LikeState { liked, like_count })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::create_test_post;
    use fandom_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn service(like_db: MockDatabase, post_db: MockDatabase) -> LikeService {
        LikeService::new(
            PostLikeRepository::new(Arc::new(like_db.into_connection())),
            PostRepository::new(Arc::new(post_db.into_connection())),
            NotificationService::new(NotificationRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            ))),
        )
    }

    #[tokio::test]
    async fn test_toggle_off() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[count_row(4)]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1", None)]]),
        );

        let state = service.toggle("u2", "p1").await.unwrap();
        assert_eq!(
            state,
            LikeState {
                liked: false,
                like_count: 4
            }
        );
    }

    #[tokio::test]
    async fn test_self_like_on() {
        // Self-like: no notification row is written
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .append_query_results([[post_like::Model {
                    id: "l1".to_string(),
                    user_id: "u1".to_string(),
                    post_id: "p1".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .append_query_results([[count_row(1)]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1", None)]]),
        );

        let state = service.toggle("u1", "p1").await.unwrap();
        assert!(state.liked);
        assert_eq!(state.like_count, 1);
    }

    #[tokio::test]
    async fn test_like_hidden_post() {
        let mut hidden = create_test_post("p1", "u1", None);
        hidden.is_hidden = true;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[hidden]]),
        );

        assert!(matches!(
            service.toggle("u2", "p1").await,
            Err(AppError::NotFound(_))
        ));
    }
}
