//! Page/limit query parameters shared by listing endpoints.

use serde::Deserialize;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Postgres binds OFFSET as a signed bigint.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset of the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page
            .unwrap_or(1)
            .saturating_sub(1)
            .saturating_mul(self.limit())
            .min(MAX_OFFSET)
    }

    /// Whether this is the default first page, the only one the route cache keeps.
    #[must_use]
    pub fn is_first_default(&self) -> bool {
        self.page.unwrap_or(1) <= 1 && self.limit() == DEFAULT_PAGE_SIZE
    }
}
