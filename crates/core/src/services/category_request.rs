//! Requests from users for new group categories.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{
        category_request, fan_group::GroupType, manager_application::ReviewStatus,
        notification::NotificationKind,
    },
    repositories::{CategoryRequestRepository, FanGroupRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::{
    group::{CreateGroupInput, GroupService, slugify},
    notification::{NewNotification, NotificationService},
};

const LIST_LIMIT: u64 = 200;

/// Input for requesting a new category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCategoryInput {
    #[validate(length(min = 2, max = 80))]
    pub name: String,

    pub group_type: GroupType,

    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// Category request service.
#[derive(Clone)]
pub struct CategoryRequestService {
    request_repo: CategoryRequestRepository,
    group_repo: FanGroupRepository,
    groups: GroupService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl CategoryRequestService {
    /// Create a new category request service.
    #[must_use]
    pub const fn new(
        request_repo: CategoryRequestRepository,
        group_repo: FanGroupRepository,
        groups: GroupService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            request_repo,
            group_repo,
            groups,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a request. Names that collide with an existing group or a
    /// pending request (by slug) are refused.
    pub async fn submit(
        &self,
        user_id: &str,
        input: SubmitCategoryInput,
    ) -> AppResult<category_request::Model> {
        input.validate()?;

        let name = input.name.trim().to_string();
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "o nome precisa conter letras ou números".to_string(),
            ));
        }
        if self.group_repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict("esta categoria já existe".to_string()));
        }
        if self.request_repo.find_pending_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(
                "já existe um pedido pendente para esta categoria".to_string(),
            ));
        }

        let model = category_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(name),
            slug: Set(slug),
            group_type: Set(input.group_type),
            reason: Set(input
                .reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())),
            status: Set(ReviewStatus::Pending),
            created_group_id: Set(None),
            reviewed_by: Set(None),
            created_at: Set(Utc::now().into()),
            reviewed_at: Set(None),
        };

        let request = self.request_repo.create(model).await?;
        info!(request_id = %request.id, slug = %request.slug, "Category request submitted");
        Ok(request)
    }

    /// List requests, optionally by status.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
    ) -> AppResult<Vec<category_request::Model>> {
        self.request_repo.list(status, LIST_LIMIT).await
    }

    /// Approve: create the group and record it on the request.
    pub async fn approve(&self, admin_id: &str, id: &str) -> AppResult<category_request::Model> {
        let request = self.pending(id).await?;

        let group = self
            .groups
            .create(CreateGroupInput {
                name: request.name.clone(),
                group_type: request.group_type,
                description: None,
                image_url: None,
            })
            .await?;

        let updated = self
            .request_repo
            .review(id, ReviewStatus::Approved, admin_id, Some(&group.id))
            .await?;
        if updated == 0 {
            return Err(already_reviewed());
        }
        info!(request_id = %id, group_id = %group.id, admin_id = %admin_id, "Category request approved");

        self.notifications
            .notify(
                NewNotification::new(&request.user_id, NotificationKind::Category)
                    .actor(admin_id)
                    .message(format!("A categoria {} foi criada!", group.name)),
            )
            .await;

        Ok(category_request::Model {
            status: ReviewStatus::Approved,
            created_group_id: Some(group.id),
            reviewed_by: Some(admin_id.to_string()),
            ..request
        })
    }

    /// Reject a pending request.
    pub async fn reject(&self, admin_id: &str, id: &str) -> AppResult<category_request::Model> {
        let request = self.pending(id).await?;

        let updated = self
            .request_repo
            .review(id, ReviewStatus::Rejected, admin_id, None)
            .await?;
        if updated == 0 {
            return Err(already_reviewed());
        }
        info!(request_id = %id, admin_id = %admin_id, "Category request rejected");

        self.notifications
            .notify(
                NewNotification::new(&request.user_id, NotificationKind::Category)
                    .actor(admin_id)
                    .message(format!("O pedido da categoria {} não foi aprovado.", request.name)),
            )
            .await;

        Ok(category_request::Model {
            status: ReviewStatus::Rejected,
            reviewed_by: Some(admin_id.to_string()),
            ..request
        })
    }

    async fn pending(&self, id: &str) -> AppResult<category_request::Model> {
        let request = self.request_repo.get_by_id(id).await?;
        if request.status == ReviewStatus::Pending {
            Ok(request)
        } else {
            Err(already_reviewed())
        }
    }
}

fn already_reviewed() -> AppError {
    AppError::BadRequest("este pedido já foi analisado".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::create_test_group;
    use fandom_db::{
        entities::fan_group,
        repositories::{ModeratorRepository, NotificationRepository, ProfileRepository},
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_request(id: &str, status: ReviewStatus) -> category_request::Model {
        category_request::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: "Stray Kids".to_string(),
            slug: "stray-kids".to_string(),
            group_type: GroupType::Idol,
            reason: None,
            status,
            created_group_id: None,
            reviewed_by: None,
            created_at: Utc::now().into(),
            reviewed_at: None,
        }
    }

    fn service(request_db: MockDatabase, group_db: MockDatabase) -> CategoryRequestService {
        let group_conn = Arc::new(group_db.into_connection());
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let groups = GroupService::new(
            FanGroupRepository::new(group_conn.clone()),
            ModeratorRepository::new(empty()),
            ProfileRepository::new(empty()),
        );
        CategoryRequestService::new(
            CategoryRequestRepository::new(Arc::new(request_db.into_connection())),
            FanGroupRepository::new(group_conn),
            groups,
            NotificationService::new(NotificationRepository::new(empty())),
        )
    }

    #[tokio::test]
    async fn test_submit_existing_group() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "stray-kids")]]),
        );

        let result = service
            .submit(
                "u1",
                SubmitCategoryInput {
                    name: "Stray Kids".to_string(),
                    group_type: GroupType::Idol,
                    reason: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_submit_duplicate_pending() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("r1", ReviewStatus::Pending)]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<fan_group::Model>::new()]),
        );

        let result = service
            .submit(
                "u2",
                SubmitCategoryInput {
                    name: "STRAY KIDS".to_string(),
                    group_type: GroupType::Idol,
                    reason: Some("Muitos fãs aqui".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approve_creates_group() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("r1", ReviewStatus::Pending)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<fan_group::Model>::new()])
                .append_query_results([[create_test_group("g9", "stray-kids")]]),
        );

        let approved = service.approve("admin", "r1").await.unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert_eq!(approved.created_group_id.as_deref(), Some("g9"));
    }

    #[tokio::test]
    async fn test_reject_twice() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("r1", ReviewStatus::Rejected)]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        assert!(matches!(
            service.reject("admin", "r1").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
