//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations
//! - Server-side list filtering and paging
//! - Settings cache (volatile)

mod cache;
mod database;
mod models;
mod query;

pub use cache::SettingsCache;
pub use database::{Database, GroupCount, ToolUsageTotal};
pub use models::*;
pub use query::{DEFAULT_PAGE_SIZE, ListParams, MAX_PAGE_SIZE, Page, like_pattern};
