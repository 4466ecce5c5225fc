//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use chrono::Utc;
use fandom_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, sea_query::Expr,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

/// Pinned posts first, then newest first.
fn feed_order(query: Select<Post>) -> Select<Post> {
    query
        .order_by_desc(post::Column::IsPinned)
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("publicação {id}")))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Comments and likes go with it.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Visible posts across all groups.
    pub async fn find_feed(&self, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        feed_order(Post::find().filter(post::Column::IsHidden.eq(false)))
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts of one group. Hidden posts are included only for moderators.
    pub async fn find_by_group(
        &self,
        group_id: &str,
        include_hidden: bool,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find().filter(post::Column::GroupId.eq(group_id));
        if !include_hidden {
            query = query.filter(post::Column::IsHidden.eq(false));
        }

        feed_order(query)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Visible ingested news posts, newest first.
    pub async fn find_news(&self, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::IsNews.eq(true))
            .filter(post::Column::IsHidden.eq(false))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts written by a user, newest first.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        include_hidden: bool,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find().filter(post::Column::AuthorId.eq(author_id));
        if !include_hidden {
            query = query.filter(post::Column::IsHidden.eq(false));
        }

        query
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Source URLs among `urls` that already back a post.
    pub async fn find_existing_source_urls(&self, urls: &[String]) -> AppResult<Vec<String>> {
        if urls.is_empty() {
            return Ok(vec![]);
        }

        let posts = Post::find()
            .filter(post::Column::SourceUrl.is_in(urls.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(posts.into_iter().filter_map(|p| p.source_url).collect())
    }

    /// Increment the view counter (single UPDATE query, no fetch).
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::ViewsCount,
                Expr::col(post::Column::ViewsCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the pinned flag.
    pub async fn set_pinned(&self, id: &str, pinned: bool) -> AppResult<u64> {
        let result = Post::update_many()
            .col_expr(post::Column::IsPinned, Expr::value(pinned))
            .col_expr(post::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Set the hidden flag.
    pub async fn set_hidden(&self, id: &str, hidden: bool) -> AppResult<u64> {
        let result = Post::update_many()
            .col_expr(post::Column::IsHidden, Expr::value(hidden))
            .col_expr(post::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count posts by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::IsHidden.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all posts.
    pub async fn count(&self) -> AppResult<u64> {
        Post::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: &str, author_id: &str, group_id: Option<&str>) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            group_id: group_id.map(ToString::to_string),
            title: "Comeback anunciado".to_string(),
            content: "Novo álbum em março".to_string(),
            image_url: None,
            source_url: None,
            is_news: false,
            is_pinned: false,
            is_hidden: false,
            views_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1", None)]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let post = repo.get_by_id("p1").await.unwrap();

        assert_eq!(post.author_id, "u1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_feed() {
        let mut pinned = create_test_post("p1", "u1", Some("g1"));
        pinned.is_pinned = true;
        let regular = create_test_post("p2", "u2", None);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pinned, regular]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let feed = repo.find_feed(20, 0).await.unwrap();

        assert_eq!(feed.len(), 2);
        assert!(feed[0].is_pinned);
    }

    #[tokio::test]
    async fn test_find_existing_source_urls() {
        let mut news = create_test_post("p1", "bot", None);
        news.is_news = true;
        news.source_url = Some("https://news.example.com/article/1".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[news]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let existing = repo
            .find_existing_source_urls(&[
                "https://news.example.com/article/1".to_string(),
                "https://news.example.com/article/2".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(existing, vec!["https://news.example.com/article/1"]);
    }

    #[tokio::test]
    async fn test_increment_views() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(repo.increment_views("p1").await.is_ok());
    }

    #[tokio::test]
    async fn test_count_by_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.count_by_author("u1").await.unwrap(), 7);
    }
}
