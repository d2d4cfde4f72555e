//! In-memory caches
//!
//! These caches are volatile and cleared on restart.
//! Uses Moka for concurrent caching.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::database::Database;
use super::models::SiteSettings;
use crate::error::AppError;

// =============================================================================
// Settings Cache
// =============================================================================

/// Read-through cache for the singleton settings document
///
/// Public pages and the login path read settings on every request; writes go
/// through [`SettingsCache::store`], which replaces the cached copy.
pub struct SettingsCache {
    /// Single entry keyed by `()`
    settings: Cache<(), Arc<SiteSettings>>,
}

impl SettingsCache {
    /// Create new settings cache
    ///
    /// # Arguments
    /// * `ttl` - Time-to-live in seconds before the document is re-read
    pub fn new(ttl: u64) -> Self {
        let settings = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl.max(1)))
            .build();

        Self { settings }
    }

    /// Get settings, loading them from the database on a miss
    ///
    /// A database without a stored document yields the defaults.
    pub async fn get(&self, db: &Database) -> Result<Arc<SiteSettings>, AppError> {
        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};

        if let Some(settings) = self.settings.get(&()).await {
            CACHE_HITS_TOTAL.with_label_values(&["settings"]).inc();
            return Ok(settings);
        }
        CACHE_MISSES_TOTAL.with_label_values(&["settings"]).inc();

        let settings = Arc::new(db.get_site_settings().await?.unwrap_or_default());
        self.settings.insert((), settings.clone()).await;
        Ok(settings)
    }

    /// Persist a new settings document and replace the cached copy
    pub async fn store(
        &self,
        db: &Database,
        settings: SiteSettings,
    ) -> Result<Arc<SiteSettings>, AppError> {
        db.put_site_settings(&settings, chrono::Utc::now()).await?;

        let settings = Arc::new(settings);
        self.settings.insert((), settings.clone()).await;
        Ok(settings)
    }
}
