//! Site settings service
//!
//! The settings document is a singleton replaced wholesale. Reads go
//! through [`SettingsCache`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::Session;
use crate::data::{Database, SecurityEventType, SecuritySettings, SettingsCache, SiteSettings};
use crate::error::AppError;
use crate::service::SecurityService;

/// Partial update of the security policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityPatch {
    pub require_two_factor: Option<bool>,
    pub session_timeout_minutes: Option<i64>,
    pub max_login_attempts: Option<i64>,
    pub lockout_minutes: Option<i64>,
    pub password_min_length: Option<i64>,
    pub allow_registration: Option<bool>,
}

impl SecurityPatch {
    /// Apply the present fields; returns the names of the ones that changed
    pub fn apply(&self, policy: &mut SecuritySettings) -> Vec<&'static str> {
        let mut changed = Vec::new();

        macro_rules! apply_field {
            ($field:ident) => {
                if let Some(value) = self.$field {
                    if policy.$field != value {
                        policy.$field = value;
                        changed.push(stringify!($field));
                    }
                }
            };
        }

        apply_field!(require_two_factor);
        apply_field!(session_timeout_minutes);
        apply_field!(max_login_attempts);
        apply_field!(lockout_minutes);
        apply_field!(password_min_length);
        apply_field!(allow_registration);
        changed
    }
}

/// Settings visible to anonymous visitors
#[derive(Debug, Clone, Serialize)]
pub struct PublicSiteInfo {
    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,
    pub theme: String,
    pub maintenance_mode: bool,
    pub allow_registration: bool,
}

impl From<&SiteSettings> for PublicSiteInfo {
    fn from(settings: &SiteSettings) -> Self {
        Self {
            site_name: settings.site_name.clone(),
            site_description: settings.site_description.clone(),
            contact_email: settings.contact_email.clone(),
            theme: settings.theme.clone(),
            maintenance_mode: settings.maintenance_mode,
            allow_registration: settings.security.allow_registration,
        }
    }
}

/// Settings service
pub struct SettingsService {
    db: Arc<Database>,
    cache: Arc<SettingsCache>,
}

impl SettingsService {
    pub fn new(db: Arc<Database>, cache: Arc<SettingsCache>) -> Self {
        Self { db, cache }
    }

    pub async fn get(&self) -> Result<Arc<SiteSettings>, AppError> {
        self.cache.get(&self.db).await
    }

    pub async fn public_info(&self) -> Result<PublicSiteInfo, AppError> {
        Ok(PublicSiteInfo::from(self.get().await?.as_ref()))
    }

    /// Fail with 503 while the site is in maintenance mode
    pub async fn ensure_writable(&self) -> Result<(), AppError> {
        if self.get().await?.maintenance_mode {
            return Err(AppError::Unavailable(
                "The site is under maintenance, please try again later".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the whole document (super admins only)
    pub async fn replace(
        &self,
        session: &Session,
        settings: SiteSettings,
    ) -> Result<Arc<SiteSettings>, AppError> {
        session.require_super_admin()?;
        settings.validate()?;

        let stored = self.cache.store(&self.db, settings).await?;
        tracing::info!(admin = %session.email, "Site settings replaced");

        SecurityService::new(self.db.clone())
            .record_quietly(
                SecurityEventType::SettingsChanged,
                Some(&session.email),
                None,
                "Site settings updated",
            )
            .await;
        Ok(stored)
    }

    /// Toggle individual security policy fields (super admins only)
    pub async fn patch_security(
        &self,
        session: &Session,
        patch: SecurityPatch,
    ) -> Result<Arc<SiteSettings>, AppError> {
        session.require_super_admin()?;

        let mut settings = self.get().await?.as_ref().clone();
        let changed = patch.apply(&mut settings.security);
        if changed.is_empty() {
            return self.get().await;
        }
        settings.validate()?;

        let stored = self.cache.store(&self.db, settings).await?;
        tracing::info!(admin = %session.email, fields = ?changed, "Security policy changed");

        SecurityService::new(self.db.clone())
            .record_quietly(
                SecurityEventType::PolicyChanged,
                Some(&session.email),
                None,
                format!("Changed {}", changed.join(", ")),
            )
            .await;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_reports_only_changed_fields() {
        let mut policy = SecuritySettings::default();
        let patch = SecurityPatch {
            require_two_factor: Some(true),
            max_login_attempts: Some(policy.max_login_attempts),
            lockout_minutes: Some(30),
            ..SecurityPatch::default()
        };

        let changed = patch.apply(&mut policy);
        assert_eq!(changed, vec!["require_two_factor", "lockout_minutes"]);
        assert!(policy.require_two_factor);
        assert_eq!(policy.lockout_minutes, 30);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut policy = SecuritySettings::default();
        assert!(SecurityPatch::default().apply(&mut policy).is_empty());
        assert_eq!(policy, SecuritySettings::default());
    }
}
