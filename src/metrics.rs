//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Counter, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Public surface
    pub static ref CONTACT_SUBMISSIONS_TOTAL: IntCounter = IntCounter::new(
        "toolhub_contact_submissions_total",
        "Total number of contact form submissions"
    ).expect("metric can be created");
    pub static ref TOOL_USAGE_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("toolhub_tool_usage_total", "Total number of recorded tool invocations"),
        &["tool_id"]
    ).expect("metric can be created");

    // Back-office
    pub static ref ADMIN_LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("toolhub_admin_logins_total", "Admin login attempts by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref UNREAD_NOTIFICATIONS: IntGauge = IntGauge::new(
        "toolhub_unread_notifications",
        "Unread admin notifications in the published snapshot"
    ).expect("metric can be created");
    pub static ref NOTIFICATION_SUBSCRIBERS: IntGauge = IntGauge::new(
        "toolhub_notification_subscribers",
        "Open admin notification streams"
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("toolhub_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("toolhub_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounter = IntCounter::new(
        "toolhub_media_uploads_total",
        "Total number of media uploads"
    ).expect("metric can be created");
    pub static ref MEDIA_BYTES_UPLOADED: Counter = Counter::new(
        "toolhub_media_bytes_uploaded_total",
        "Total bytes of media uploaded"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("toolhub_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; repeated registrations are ignored.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CONTACT_SUBMISSIONS_TOTAL.clone()),
        Box::new(TOOL_USAGE_TOTAL.clone()),
        Box::new(ADMIN_LOGINS_TOTAL.clone()),
        Box::new(UNREAD_NOTIFICATIONS.clone()),
        Box::new(NOTIFICATION_SUBSCRIBERS.clone()),
        Box::new(CACHE_HITS_TOTAL.clone()),
        Box::new(CACHE_MISSES_TOTAL.clone()),
        Box::new(MEDIA_UPLOADS_TOTAL.clone()),
        Box::new(MEDIA_BYTES_UPLOADED.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(error) = REGISTRY.register(collector) {
            tracing::debug!(%error, "Metric already registered");
        }
    }

    tracing::info!("Metrics registry initialized");
}
