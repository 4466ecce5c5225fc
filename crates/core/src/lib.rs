//! Core business logic for fandom.
//!
//! Every mutation follows the same shape: authenticate the caller, check
//! authority against the related tables, write, then let the API layer
//! revalidate the cached pages it touched.

pub mod services;

pub use services::*;
