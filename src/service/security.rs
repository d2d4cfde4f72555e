//! Security audit trail and login lockout

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::data::{Database, EntityId, SecurityEvent, SecurityEventType, SecuritySettings};
use crate::error::AppError;

/// Security service
pub struct SecurityService {
    db: Arc<Database>,
}

impl SecurityService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append an event to the audit trail
    ///
    /// Severity is derived from the event type.
    pub async fn record(
        &self,
        event_type: SecurityEventType,
        actor_email: Option<&str>,
        ip_address: Option<&str>,
        description: impl Into<String>,
    ) -> Result<SecurityEvent, AppError> {
        let event = SecurityEvent {
            id: EntityId::new().0,
            event_type: event_type.as_str().to_string(),
            severity: event_type.severity().as_str().to_string(),
            actor_email: actor_email.map(str::to_string),
            ip_address: ip_address.map(str::to_string),
            description: description.into(),
            created_at: Utc::now(),
        };
        self.db.insert_security_event(&event).await?;

        tracing::info!(
            event_type = %event.event_type,
            severity = %event.severity,
            actor = ?event.actor_email,
            "Security event recorded"
        );
        Ok(event)
    }

    /// Record an event without failing the caller
    pub async fn record_quietly(
        &self,
        event_type: SecurityEventType,
        actor_email: Option<&str>,
        ip_address: Option<&str>,
        description: impl Into<String>,
    ) {
        if let Err(error) = self
            .record(event_type, actor_email, ip_address, description)
            .await
        {
            tracing::warn!(%error, event_type = %event_type, "Failed to record security event");
        }
    }

    /// Whether `email` has used up its login attempts
    ///
    /// Failures count inside the lockout window and only after the most
    /// recent successful login.
    pub async fn is_locked_out(
        &self,
        email: &str,
        policy: &SecuritySettings,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let last_success = self
            .db
            .latest_security_event_at(email, SecurityEventType::LoginSuccess)
            .await?;
        let since = lockout_window_start(now, policy.lockout_minutes, last_success);

        let failures = self
            .db
            .count_security_events_since(email, SecurityEventType::LoginFailure, since)
            .await?;

        Ok(failures >= policy.max_login_attempts)
    }
}

fn lockout_window_start(
    now: DateTime<Utc>,
    lockout_minutes: i64,
    last_success: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let window = now - Duration::minutes(lockout_minutes);
    match last_success {
        Some(success) if success > window => success,
        _ => window,
    }
}
