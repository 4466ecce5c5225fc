//! Community post service.

use std::collections::HashMap;

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{fan_group, post, profile},
    repositories::{
        CommentRepository, FanGroupRepository, PostLikeRepository, PostRepository,
        ProfileRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::services::{
    comment::{CommentView, attach_authors},
    pagination::Pagination,
    permission::PermissionService,
    points::PointsService,
    profile::ProfileSummary,
};

/// Posts shown on a profile page.
const AUTHOR_POSTS_LIMIT: u64 = 50;

/// Trimmed text of a required field, rejecting blank input.
fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} não pode ficar vazio")));
    }
    Ok(trimmed.to_string())
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 150))]
    pub title: String,

    #[validate(length(min = 1, max = 10000))]
    pub content: String,

    #[validate(url)]
    pub image_url: Option<String>,

    /// Slug of the group to post in; `None` posts to the general feed.
    pub group_slug: Option<String>,
}

/// Input for editing a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 10000))]
    pub content: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Group reference embedded in post listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<&fan_group::Model> for GroupRef {
    fn from(g: &fan_group::Model) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            slug: g.slug.clone(),
        }
    }
}

/// Feed entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: post::Model,
    pub author: Option<ProfileSummary>,
    pub group: Option<GroupRef>,
}

/// Post page data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub post: post::Model,
    pub author: Option<ProfileSummary>,
    pub group: Option<GroupRef>,
    pub like_count: u64,
    pub liked_by_me: bool,
    pub comment_count: u64,
    pub comments: Vec<CommentView>,
}

/// Post service.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    group_repo: FanGroupRepository,
    profile_repo: ProfileRepository,
    comment_repo: CommentRepository,
    like_repo: PostLikeRepository,
    permissions: PermissionService,
    points: PointsService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        post_repo: PostRepository,
        group_repo: FanGroupRepository,
        profile_repo: ProfileRepository,
        comment_repo: CommentRepository,
        like_repo: PostLikeRepository,
        permissions: PermissionService,
        points: PointsService,
    ) -> Self {
        Self {
            post_repo,
            group_repo,
            profile_repo,
            comment_repo,
            like_repo,
            permissions,
            points,
            id_gen: IdGenerator::new(),
        }
    }

    /// Community feed: visible posts, pinned first, newest first.
    pub async fn feed(&self, page: Pagination) -> AppResult<Vec<PostSummary>> {
        let posts = self
            .post_repo
            .find_feed(page.limit(), page.offset())
            .await?;
        self.summarize(posts).await
    }

    /// Feed of one group.
    pub async fn group_feed(&self, group_id: &str, page: Pagination) -> AppResult<Vec<PostSummary>> {
        let posts = self
            .post_repo
            .find_by_group(group_id, false, page.limit(), page.offset())
            .await?;
        self.summarize(posts).await
    }

    /// News feed.
    pub async fn news(&self, page: Pagination) -> AppResult<Vec<PostSummary>> {
        let posts = self
            .post_repo
            .find_news(page.limit(), page.offset())
            .await?;
        self.summarize(posts).await
    }

    /// Posts on a profile page. Hidden posts are listed for their author and admins.
    pub async fn list_by_author(
        &self,
        username: &str,
        viewer: Option<&profile::Model>,
    ) -> AppResult<Vec<PostSummary>> {
        let author = self.profile_repo.get_by_username(username).await?;
        let include_hidden = viewer.is_some_and(|v| v.is_admin || v.id == author.id);
        let posts = self
            .post_repo
            .find_by_author(&author.id, include_hidden, AUTHOR_POSTS_LIMIT)
            .await?;
        self.summarize(posts).await
    }

    /// Create a post and reward its author.
    pub async fn create(
        &self,
        author: &profile::Model,
        input: CreatePostInput,
    ) -> AppResult<PostSummary> {
        input.validate()?;
        let title = required_text(&input.title, "o título")?;
        let content = required_text(&input.content, "o conteúdo")?;

        let group = match input.group_slug.as_deref().filter(|s| !s.is_empty()) {
            Some(slug) => Some(self.group_repo.get_by_slug(slug).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author.id.clone()),
            group_id: Set(group.as_ref().map(|g| g.id.clone())),
            title: Set(title),
            content: Set(content),
            image_url: Set(input.image_url),
            source_url: Set(None),
            is_news: Set(false),
            is_pinned: Set(false),
            is_hidden: Set(false),
            views_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let post = self.post_repo.create(model).await?;
        info!(post_id = %post.id, author_id = %author.id, "Post created");

        self.points
            .reward_best_effort(&author.id, self.points.economy().post_reward, "post")
            .await;

        Ok(PostSummary {
            post,
            author: Some(ProfileSummary::from(author)),
            group: group.as_ref().map(GroupRef::from),
        })
    }

    /// Post page. Hidden posts are only shown to those with authority over them.
    pub async fn get(&self, viewer: Option<&profile::Model>, id: &str) -> AppResult<PostPage> {
        let mut post = self.get_visible(viewer, id).await?;
        if self.record_view(&post.id).await {
            post.views_count += 1;
        }

        let author = self
            .profile_repo
            .find_by_id(&post.author_id)
            .await?
            .as_ref()
            .map(ProfileSummary::from);
        let group = match post.group_id.as_deref() {
            Some(group_id) => self
                .group_repo
                .find_by_id(group_id)
                .await?
                .as_ref()
                .map(GroupRef::from),
            None => None,
        };

        let like_count = self.like_repo.count_by_post(&post.id).await?;
        let liked_by_me = match viewer {
            Some(v) => self.like_repo.has_liked(&v.id, &post.id).await?,
            None => false,
        };

        let comments = self.comment_repo.find_by_post(&post.id).await?;
        let comments = attach_authors(&self.profile_repo, comments).await?;

        Ok(PostPage {
            post,
            author,
            group,
            like_count,
            liked_by_me,
            comment_count: comments.len() as u64,
            comments,
        })
    }

    /// Count one view, best-effort. Returns whether the counter moved.
    ///
    /// Also called for page views served from the route cache.
    pub async fn record_view(&self, id: &str) -> bool {
        match self.post_repo.increment_views(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, post_id = %id, "Failed to increment view counter");
                false
            }
        }
    }

    /// Fetch a post, hiding soft-hidden posts from viewers without authority.
    pub async fn get_visible(
        &self,
        viewer: Option<&profile::Model>,
        id: &str,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        if !post.is_hidden {
            return Ok(post);
        }

        let allowed = match viewer {
            Some(v) => self
                .permissions
                .content_authority(v, &post.author_id, post.group_id.as_deref())
                .await?
                .is_some(),
            None => false,
        };

        if allowed {
            Ok(post)
        } else {
            Err(AppError::NotFound(format!("post {id}")))
        }
    }

    /// Edit a post. Only its author may.
    pub async fn update(
        &self,
        user: &profile::Model,
        id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;
        let title = input
            .title
            .as_deref()
            .map(|t| required_text(t, "o título"))
            .transpose()?;
        let content = input
            .content
            .as_deref()
            .map(|c| required_text(c, "o conteúdo"))
            .transpose()?;

        let post = self.post_repo.get_by_id(id).await?;
        if post.author_id != user.id {
            return Err(AppError::Forbidden(
                "apenas o autor pode editar este post".to_string(),
            ));
        }

        let mut active: post::ActiveModel = post.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(content) = content {
            active.content = Set(content);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.post_repo.update(active).await
    }

    /// Delete a post as its author, a moderator of its group, or an admin.
    pub async fn delete(&self, user: &profile::Model, id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        let authority = self
            .permissions
            .require_content_authority(user, &post.author_id, post.group_id.as_deref())
            .await?;

        self.post_repo.delete(id).await?;
        info!(post_id = %id, user_id = %user.id, authority = ?authority, "Post deleted");
        Ok(post)
    }

    /// Flip the pinned flag.
    pub async fn toggle_pin(&self, user: &profile::Model, id: &str) -> AppResult<post::Model> {
        let mut post = self.post_repo.get_by_id(id).await?;
        self.permissions
            .require_moderation_authority(user, post.group_id.as_deref())
            .await?;

        post.is_pinned = !post.is_pinned;
        self.post_repo.set_pinned(id, post.is_pinned).await?;
        info!(post_id = %id, pinned = post.is_pinned, user_id = %user.id, "Post pin toggled");
        Ok(post)
    }

    /// Flip the hidden flag.
    pub async fn toggle_hide(&self, user: &profile::Model, id: &str) -> AppResult<post::Model> {
        let mut post = self.post_repo.get_by_id(id).await?;
        self.permissions
            .require_moderation_authority(user, post.group_id.as_deref())
            .await?;

        post.is_hidden = !post.is_hidden;
        self.post_repo.set_hidden(id, post.is_hidden).await?;
        info!(post_id = %id, hidden = post.is_hidden, user_id = %user.id, "Post visibility toggled");
        Ok(post)
    }

    /// Attach authors and groups to a page of posts with two batch lookups.
    async fn summarize(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostSummary>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, ProfileSummary> = self
            .profile_repo
            .find_by_ids(&author_ids)
            .await?
            .iter()
            .map(|p| (p.id.clone(), ProfileSummary::from(p)))
            .collect();

        let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
        group_ids.sort();
        group_ids.dedup();
        let groups: HashMap<String, GroupRef> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            self.group_repo
                .find_by_ids(&group_ids)
                .await?
                .iter()
                .map(|g| (g.id.clone(), GroupRef::from(g)))
                .collect()
        };

        Ok(posts
            .into_iter()
            .map(|post| PostSummary {
                author: authors.get(&post.author_id).cloned(),
                group: post.group_id.as_ref().and_then(|g| groups.get(g).cloned()),
                post,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{
        create_test_comment, create_test_group, create_test_post, create_test_profile,
    };
    use fandom_common::config::EconomyConfig;
    use fandom_db::{
        entities::{comment, group_moderator},
        repositories::ModeratorRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    /// One mock database per repository, in constructor order.
    struct Mocks {
        post: MockDatabase,
        group: MockDatabase,
        profile: MockDatabase,
        comment: MockDatabase,
        like: MockDatabase,
        moderator: MockDatabase,
        points: MockDatabase,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                post: MockDatabase::new(DatabaseBackend::Postgres),
                group: MockDatabase::new(DatabaseBackend::Postgres),
                profile: MockDatabase::new(DatabaseBackend::Postgres),
                comment: MockDatabase::new(DatabaseBackend::Postgres),
                like: MockDatabase::new(DatabaseBackend::Postgres),
                moderator: MockDatabase::new(DatabaseBackend::Postgres),
                points: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }

        fn build(self) -> PostService {
            let conn = |db: MockDatabase| Arc::new(db.into_connection());
            PostService::new(
                PostRepository::new(conn(self.post)),
                FanGroupRepository::new(conn(self.group)),
                ProfileRepository::new(conn(self.profile)),
                CommentRepository::new(conn(self.comment)),
                PostLikeRepository::new(conn(self.like)),
                PermissionService::new(ModeratorRepository::new(conn(self.moderator))),
                PointsService::new(
                    ProfileRepository::new(conn(self.points)),
                    EconomyConfig::default(),
                ),
            )
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let service = Mocks::new().build();
        let author = create_test_profile("u1", false);

        let result = service
            .create(
                &author,
                CreatePostInput {
                    title: String::new(),
                    content: "conteúdo".to_string(),
                    image_url: None,
                    group_slug: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_and_content() {
        let service = Mocks::new().build();
        let author = create_test_profile("u1", false);

        for (title, content) in [("   ", "conteúdo"), ("Título", " \n\t ")] {
            let result = service
                .create(
                    &author,
                    CreatePostInput {
                        title: title.to_string(),
                        content: content.to_string(),
                        image_url: None,
                        group_slug: None,
                    },
                )
                .await;
            assert!(matches!(result, Err(AppError::BadRequest(_))), "{title:?}");
        }
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let service = Mocks::new().build();
        let author = create_test_profile("u1", false);

        let result = service
            .update(
                &author,
                "p1",
                UpdatePostInput {
                    title: Some("  ".to_string()),
                    content: None,
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_record_view() {
        let mut mocks = Mocks::new();
        mocks.post = mocks.post.append_exec_results([exec(1)]);
        let service = mocks.build();

        assert!(service.record_view("p1").await);
        // Exec buffer exhausted: the failure is logged, not returned
        assert!(!service.record_view("p1").await);
    }

    #[tokio::test]
    async fn test_create_unknown_group() {
        let mut mocks = Mocks::new();
        mocks.group = mocks
            .group
            .append_query_results([Vec::<fan_group::Model>::new()]);
        let service = mocks.build();
        let author = create_test_profile("u1", false);

        let result = service
            .create(
                &author,
                CreatePostInput {
                    title: "Teaser novo".to_string(),
                    content: "Saiu agora!".to_string(),
                    image_url: None,
                    group_slug: Some("nao-existe".to_string()),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_in_group_rewards_author() {
        let mut mocks = Mocks::new();
        mocks.group = mocks
            .group
            .append_query_results([[create_test_group("g1", "bts")]]);
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", Some("g1"))]]);
        mocks.points = mocks.points.append_exec_results([exec(1)]);
        let service = mocks.build();
        let author = create_test_profile("u1", false);

        let summary = service
            .create(
                &author,
                CreatePostInput {
                    title: "Comeback confirmado!".to_string(),
                    content: "O grupo volta em novembro.".to_string(),
                    image_url: None,
                    group_slug: Some("bts".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.post.id, "p1");
        assert_eq!(summary.group.unwrap().slug, "bts");
        assert_eq!(summary.author.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_get_hidden_post_anonymous_not_found() {
        let mut hidden = create_test_post("p1", "u1", Some("g1"));
        hidden.is_hidden = true;

        let mut mocks = Mocks::new();
        mocks.post = mocks.post.append_query_results([[hidden]]);
        let service = mocks.build();

        assert!(matches!(
            service.get(None, "p1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_hidden_post_visible_to_moderator() {
        let mut hidden = create_test_post("p1", "u1", Some("g1"));
        hidden.is_hidden = true;

        let mut mocks = Mocks::new();
        mocks.post = mocks.post.append_query_results([[hidden]]);
        mocks.moderator = mocks.moderator.append_query_results([[group_moderator::Model {
            id: "gm1".to_string(),
            group_id: "g1".to_string(),
            user_id: "mod".to_string(),
            created_at: Utc::now().into(),
        }]]);
        let service = mocks.build();
        let moderator = create_test_profile("mod", false);

        let post = service.get_visible(Some(&moderator), "p1").await.unwrap();
        assert!(post.is_hidden);
    }

    #[tokio::test]
    async fn test_get_page_data() {
        let mut mocks = Mocks::new();
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", None)]])
            .append_exec_results([exec(1)]);
        mocks.profile = mocks
            .profile
            .append_query_results([[create_test_profile("u1", false)]])
            .append_query_results([[create_test_profile("u2", false)]]);
        mocks.like = mocks
            .like
            .append_query_results([[count_row(3)]])
            .append_query_results([Vec::<fandom_db::entities::post_like::Model>::new()]);
        mocks.comment = mocks
            .comment
            .append_query_results([[create_test_comment("c1", "p1", "u2")]]);
        let service = mocks.build();
        let viewer = create_test_profile("u3", false);

        let page = service.get(Some(&viewer), "p1").await.unwrap();

        assert_eq!(page.post.views_count, 1);
        assert_eq!(page.like_count, 3);
        assert!(!page.liked_by_me);
        assert_eq!(page.comment_count, 1);
        assert_eq!(page.comments[0].author.as_ref().unwrap().id, "u2");
        assert!(page.group.is_none());
    }

    #[tokio::test]
    async fn test_view_counter_failure_is_swallowed() {
        let mut mocks = Mocks::new();
        // No exec result queued: the view counter update fails
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", None)]]);
        mocks.profile = mocks
            .profile
            .append_query_results([[create_test_profile("u1", false)]]);
        mocks.like = mocks.like.append_query_results([[count_row(0)]]);
        mocks.comment = mocks
            .comment
            .append_query_results([Vec::<comment::Model>::new()]);
        let service = mocks.build();

        let page = service.get(None, "p1").await.unwrap();
        assert_eq!(page.post.views_count, 0);
    }

    #[tokio::test]
    async fn test_update_by_non_author_forbidden() {
        let mut mocks = Mocks::new();
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", None)]]);
        let service = mocks.build();
        // Admins may delete but not rewrite someone else's post
        let admin = create_test_profile("admin", true);

        let result = service
            .update(
                &admin,
                "p1",
                UpdatePostInput {
                    title: Some("Editado".to_string()),
                    content: None,
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_stranger_forbidden() {
        let mut mocks = Mocks::new();
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", Some("g1"))]]);
        mocks.moderator = mocks
            .moderator
            .append_query_results([Vec::<group_moderator::Model>::new()]);
        let service = mocks.build();
        let stranger = create_test_profile("u2", false);

        assert!(matches!(
            service.delete(&stranger, "p1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_pin_by_admin() {
        let mut mocks = Mocks::new();
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", None)]])
            .append_exec_results([exec(1)]);
        let service = mocks.build();
        let admin = create_test_profile("admin", true);

        let post = service.toggle_pin(&admin, "p1").await.unwrap();
        assert!(post.is_pinned);
    }

    #[tokio::test]
    async fn test_toggle_hide_ungrouped_by_user_forbidden() {
        let mut mocks = Mocks::new();
        mocks.post = mocks
            .post
            .append_query_results([[create_test_post("p1", "u1", None)]]);
        let service = mocks.build();
        let author = create_test_profile("u1", false);

        assert!(matches!(
            service.toggle_hide(&author, "p1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_feed_attaches_authors_and_groups() {
        let mut mocks = Mocks::new();
        mocks.post = mocks.post.append_query_results([[
            create_test_post("p2", "u1", Some("g1")),
            create_test_post("p1", "u2", None),
        ]]);
        mocks.profile = mocks.profile.append_query_results([[
            create_test_profile("u1", false),
            create_test_profile("u2", false),
        ]]);
        mocks.group = mocks
            .group
            .append_query_results([[create_test_group("g1", "bts")]]);
        let service = mocks.build();

        let feed = service.feed(Pagination::default()).await.unwrap();

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].group.as_ref().unwrap().slug, "bts");
        assert!(feed[1].group.is_none());
        assert_eq!(feed[1].author.as_ref().unwrap().id, "u2");
    }
}
