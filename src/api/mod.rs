//! API layer
//!
//! HTTP handlers for:
//! - Public API (tool catalog, blog, contact form)
//! - Admin API (back-office)
//! - Static marketing pages
//! - Metrics (Prometheus)

mod admin;
pub mod dto;
pub mod metrics;
mod pages;
mod public;

pub use admin::{NotificationSnapshot, admin_router};
pub use metrics::metrics_router;
pub use pages::pages_router;
pub use public::public_router;
