//! In-process cache of anonymous page payloads keyed by route path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Default lifetime of a cached page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Community feed page.
pub const COMMUNITY: &str = "/community";
/// News feed page.
pub const NEWS: &str = "/news";
/// Group list page.
pub const GROUPS: &str = "/groups";
/// Points ranking page.
pub const RANKING: &str = "/users/ranking";

/// Path of a single post page.
#[must_use]
pub fn post_path(id: &str) -> String {
    format!("/posts/{id}")
}

/// Path of a group page.
#[must_use]
pub fn group_path(slug: &str) -> String {
    format!("/groups/{slug}")
}

/// Path of a public profile page.
#[must_use]
pub fn user_path(username: &str) -> String {
    format!("/users/{username}")
}

#[derive(Clone)]
struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

/// TTL map of rendered page data.
#[derive(Clone)]
pub struct RouteCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl RouteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Cached payload for a path, if present and fresh.
    pub async fn get(&self, path: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(path)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.payload.clone())
    }

    /// Store a payload for a path.
    pub async fn put(&self, path: impl Into<String>, payload: Value) {
        let mut entries = self.entries.write().await;

        // Drop expired entries while holding the lock anyway
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);

        entries.insert(
            path.into(),
            CacheEntry {
                payload,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Drop cached payloads for the given paths.
    pub async fn revalidate<S: AsRef<str>>(&self, paths: &[S]) {
        let mut entries = self.entries.write().await;
        for path in paths {
            if entries.remove(path.as_ref()).is_some() {
                debug!(path = path.as_ref(), "Revalidated cached page");
            }
        }
    }

    /// Drop every cached payload whose path starts with `prefix`.
    pub async fn revalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|path, _| !path.starts_with(prefix));
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_revalidate() {
        let cache = RouteCache::default();
        cache.put(COMMUNITY, json!({"posts": []})).await;
        cache.put(post_path("p1"), json!({"id": "p1"})).await;

        assert_eq!(cache.get(COMMUNITY).await, Some(json!({"posts": []})));

        cache.revalidate(&[COMMUNITY]).await;
        assert!(cache.get(COMMUNITY).await.is_none());
        assert!(cache.get("/posts/p1").await.is_some());
    }

    #[tokio::test]
    async fn test_revalidate_prefix() {
        let cache = RouteCache::default();
        cache.put(group_path("bts"), json!(1)).await;
        cache.put(group_path("twice"), json!(2)).await;
        cache.put(GROUPS, json!(3)).await;

        cache.revalidate_prefix("/groups/").await;

        assert!(cache.get("/groups/bts").await.is_none());
        assert!(cache.get("/groups/twice").await.is_none());
        assert_eq!(cache.get(GROUPS).await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = RouteCache::new(Duration::from_millis(10));
        cache.put(NEWS, json!([])).await;
        assert_eq!(cache.len().await, 1);

        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get(NEWS).await.is_none());
        assert!(cache.is_empty().await);
    }
}
