//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, cache, storage and notification operations.

mod analytics;
mod contact;
mod content;
pub mod export;
pub mod notifications;
mod security;
mod settings;
mod tools;
mod users;

pub use analytics::{AnalyticsReport, AnalyticsService};
pub use contact::{ContactService, ContactSubmission, is_plausible_email, triage_priority};
pub use content::{ContentService, EXCERPT_CHARS, PostInput, derive_excerpt, sanitize_html};
pub use notifications::{
    BadgeView, NotificationHub, NotificationService, OpenOutcome, UnreadSnapshot,
};
pub use security::SecurityService;
pub use settings::{PublicSiteInfo, SecurityPatch, SettingsService};
pub use tools::{ToolInput, ToolService, default_catalog};
pub use users::{ProfileSync, UserService};
