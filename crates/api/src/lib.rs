//! HTTP API layer for fandom.
//!
//! This crate provides the JSON API mounted under `/api`:
//!
//! - **Endpoints**: community feed, posts, groups, shop, messages, admin
//! - **Extractors**: session user, optional user, admin user
//! - **Middleware**: session resolution from bearer token or cookie
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware, request_span};
