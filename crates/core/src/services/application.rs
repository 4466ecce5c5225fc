//! Group manager ("gerente") applications.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{
        manager_application::{self, ReviewStatus},
        notification::NotificationKind,
    },
    repositories::{FanGroupRepository, ManagerApplicationRepository, ModeratorRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::{
    group::GroupService,
    notification::{NewNotification, NotificationService},
};

/// Applications listed in the back-office.
const LIST_LIMIT: u64 = 200;

/// Input for applying to moderate a group.
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyInput {
    #[validate(length(min = 10, max = 1000))]
    pub reason: String,
}

/// Manager application service.
#[derive(Clone)]
pub struct ApplicationService {
    application_repo: ManagerApplicationRepository,
    group_repo: FanGroupRepository,
    moderator_repo: ModeratorRepository,
    groups: GroupService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl ApplicationService {
    /// Create a new application service.
    #[must_use]
    pub const fn new(
        application_repo: ManagerApplicationRepository,
        group_repo: FanGroupRepository,
        moderator_repo: ModeratorRepository,
        groups: GroupService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            application_repo,
            group_repo,
            moderator_repo,
            groups,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply to moderate a group.
    ///
    /// The duplicate check is read-then-write; two concurrent submissions may
    /// both land, which reviewers resolve by rejecting one.
    pub async fn apply(
        &self,
        user_id: &str,
        group_slug: &str,
        input: ApplyInput,
    ) -> AppResult<manager_application::Model> {
        input.validate()?;

        let group = self.group_repo.get_by_slug(group_slug).await?;

        if self.moderator_repo.is_moderator(&group.id, user_id).await? {
            return Err(AppError::Conflict(
                "você já é gerente deste grupo".to_string(),
            ));
        }
        if self
            .application_repo
            .find_pending(user_id, &group.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "você já tem uma candidatura pendente para este grupo".to_string(),
            ));
        }

        let model = manager_application::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            group_id: Set(group.id.clone()),
            reason: Set(input.reason.trim().to_string()),
            status: Set(ReviewStatus::Pending),
            reviewed_by: Set(None),
            created_at: Set(Utc::now().into()),
            reviewed_at: Set(None),
        };

        let application = self.application_repo.create(model).await?;
        info!(application_id = %application.id, group_id = %group.id, "Manager application submitted");
        Ok(application)
    }

    /// List applications, optionally by status.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
    ) -> AppResult<Vec<manager_application::Model>> {
        self.application_repo.list(status, LIST_LIMIT).await
    }

    /// Approve: grant moderation, then close the application.
    pub async fn approve(
        &self,
        admin_id: &str,
        id: &str,
    ) -> AppResult<manager_application::Model> {
        let application = self.pending(id).await?;

        self.groups
            .add_moderator(&application.group_id, &application.user_id)
            .await?;
        self.close(&application, ReviewStatus::Approved, admin_id)
            .await?;

        let group_name = self
            .group_repo
            .find_by_id(&application.group_id)
            .await?
            .map_or_else(|| "o grupo".to_string(), |g| g.name);
        self.notifications
            .notify(
                NewNotification::new(&application.user_id, NotificationKind::Application)
                    .actor(admin_id)
                    .message(format!("Sua candidatura a gerente de {group_name} foi aprovada!")),
            )
            .await;

        Ok(manager_application::Model {
            status: ReviewStatus::Approved,
            reviewed_by: Some(admin_id.to_string()),
            ..application
        })
    }

    /// Reject a pending application.
    pub async fn reject(
        &self,
        admin_id: &str,
        id: &str,
    ) -> AppResult<manager_application::Model> {
        let application = self.pending(id).await?;
        self.close(&application, ReviewStatus::Rejected, admin_id)
            .await?;

        self.notifications
            .notify(
                NewNotification::new(&application.user_id, NotificationKind::Application)
                    .actor(admin_id)
                    .message("Sua candidatura a gerente não foi aprovada."),
            )
            .await;

        Ok(manager_application::Model {
            status: ReviewStatus::Rejected,
            reviewed_by: Some(admin_id.to_string()),
            ..application
        })
    }

    async fn pending(&self, id: &str) -> AppResult<manager_application::Model> {
        let application = self.application_repo.get_by_id(id).await?;
        if application.status != ReviewStatus::Pending {
            return Err(AppError::BadRequest(
                "esta candidatura já foi analisada".to_string(),
            ));
        }
        Ok(application)
    }

    async fn close(
        &self,
        application: &manager_application::Model,
        status: ReviewStatus,
        admin_id: &str,
    ) -> AppResult<()> {
        let updated = self
            .application_repo
            .review(&application.id, status, admin_id)
            .await?;
        if updated == 0 {
            return Err(AppError::BadRequest(
                "esta candidatura já foi analisada".to_string(),
            ));
        }
        info!(application_id = %application.id, status = ?status, admin_id = %admin_id, "Manager application reviewed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::create_test_group;
    use fandom_db::{
        entities::group_moderator,
        repositories::{NotificationRepository, ProfileRepository},
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_application(id: &str, status: ReviewStatus) -> manager_application::Model {
        manager_application::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            group_id: "g1".to_string(),
            reason: "Acompanho o grupo desde o debut.".to_string(),
            status,
            reviewed_by: None,
            created_at: Utc::now().into(),
            reviewed_at: None,
        }
    }

    struct Mocks {
        application: MockDatabase,
        group: MockDatabase,
        moderator: MockDatabase,
        profile: MockDatabase,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                application: MockDatabase::new(DatabaseBackend::Postgres),
                group: MockDatabase::new(DatabaseBackend::Postgres),
                moderator: MockDatabase::new(DatabaseBackend::Postgres),
                profile: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }

        fn build(self) -> ApplicationService {
            let group_conn = Arc::new(self.group.into_connection());
            let moderator_conn = Arc::new(self.moderator.into_connection());
            let groups = GroupService::new(
                FanGroupRepository::new(group_conn.clone()),
                ModeratorRepository::new(moderator_conn.clone()),
                ProfileRepository::new(Arc::new(self.profile.into_connection())),
            );
            ApplicationService::new(
                ManagerApplicationRepository::new(Arc::new(self.application.into_connection())),
                FanGroupRepository::new(group_conn),
                ModeratorRepository::new(moderator_conn),
                groups,
                NotificationService::new(NotificationRepository::new(Arc::new(
                    MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
                ))),
            )
        }
    }

    fn moderator_row() -> group_moderator::Model {
        group_moderator::Model {
            id: "gm1".to_string(),
            group_id: "g1".to_string(),
            user_id: "u1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_apply_reason_too_short() {
        let service = Mocks::new().build();
        let result = service
            .apply(
                "u1",
                "bts",
                ApplyInput {
                    reason: "quero".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_apply_already_moderator() {
        let mut mocks = Mocks::new();
        mocks.group = mocks
            .group
            .append_query_results([[create_test_group("g1", "bts")]]);
        mocks.moderator = mocks.moderator.append_query_results([[moderator_row()]]);
        let service = mocks.build();

        let result = service
            .apply(
                "u1",
                "bts",
                ApplyInput {
                    reason: "Acompanho o grupo desde o debut.".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_apply_duplicate_pending() {
        let mut mocks = Mocks::new();
        mocks.group = mocks
            .group
            .append_query_results([[create_test_group("g1", "bts")]]);
        mocks.moderator = mocks
            .moderator
            .append_query_results([Vec::<group_moderator::Model>::new()]);
        mocks.application = mocks
            .application
            .append_query_results([[create_test_application("a1", ReviewStatus::Pending)]]);
        let service = mocks.build();

        let result = service
            .apply(
                "u1",
                "bts",
                ApplyInput {
                    reason: "Acompanho o grupo desde o debut.".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approve_adds_moderator() {
        let mut mocks = Mocks::new();
        mocks.application = mocks
            .application
            .append_query_results([[create_test_application("a1", ReviewStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        mocks.moderator = mocks
            .moderator
            .append_query_results([Vec::<group_moderator::Model>::new()])
            .append_query_results([[moderator_row()]]);
        mocks.group = mocks
            .group
            .append_query_results([[create_test_group("g1", "bts")]]);
        let service = mocks.build();

        let approved = service.approve("admin", "a1").await.unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert_eq!(approved.reviewed_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_reject_already_reviewed() {
        let mut mocks = Mocks::new();
        mocks.application = mocks
            .application
            .append_query_results([[create_test_application("a1", ReviewStatus::Approved)]]);
        let service = mocks.build();

        assert!(matches!(
            service.reject("admin", "a1").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_reject_lost_race() {
        let mut mocks = Mocks::new();
        mocks.application = mocks
            .application
            .append_query_results([[create_test_application("a1", ReviewStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]);
        let service = mocks.build();

        assert!(matches!(
            service.reject("admin", "a1").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
