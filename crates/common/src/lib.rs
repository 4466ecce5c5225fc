//! Common utilities and shared types for fandom.
//!
//! This crate provides foundational components used across all fandom crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Scraping**: HTML fetching and regex extraction for the news job
//!
//! # Example
//!
//! ```no_run
//! use fandom_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on {}:{} as {id}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod scrape;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use scrape::{HttpPageSource, PageSource, ScrapedArticle};
