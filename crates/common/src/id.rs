//! ID and session token generation.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new lowercase ULID.
    ///
    /// ULIDs sort by creation time, which keeps "newest first" listings
    /// consistent with primary key order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Two v4 UUIDs: 244 random bits, no time component
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }
}
