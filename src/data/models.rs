//! Data models
//!
//! Rust structs representing database rows and the enums stored in them.
//! All generated IDs are ULIDs and all timestamps are chrono UTC values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::error::AppError;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements `as_str` and `FromStr` for an enum stored as lowercase text.
macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(AppError::Validation(format!(
                        "invalid {}: {other}",
                        $label
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// =============================================================================
// Users
// =============================================================================

/// End-user profile, keyed by the identity provider uid
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Sign-in provider: password, google, github, ...
    pub provider: String,
    pub is_active: bool,
    pub is_premium: bool,
    /// Values: user, moderator, admin
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

text_enum!(UserRole, "user role", {
    User => "user",
    Moderator => "moderator",
    Admin => "admin",
});

/// Derived account state used by the user list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatusFilter {
    Active,
    Inactive,
    Premium,
    Free,
}

text_enum!(UserStatusFilter, "user status", {
    Active => "active",
    Inactive => "inactive",
    Premium => "premium",
    Free => "free",
});

// =============================================================================
// Blog posts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    /// Sanitized HTML
    pub content: String,
    pub excerpt: String,
    pub author: String,
    /// Values: draft, published, archived
    pub status: String,
    pub tags: Json<Vec<String>>,
    /// Object key of the featured image
    pub featured_image: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

text_enum!(PostStatus, "post status", {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

// =============================================================================
// AI tools
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiTool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub icon: String,
    pub is_active: bool,
    pub is_premium: bool,
    pub usage_count: i64,
    /// Site route of the tool page, e.g. "/tools/image-enhancer"
    pub route: String,
    pub features: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One recorded tool invocation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ToolUsage {
    pub id: String,
    pub tool_id: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Contact messages
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// Values: unread, read, replied
    pub status: String,
    /// Values: low, normal, high
    pub priority: String,
    pub reply: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Unread,
    Read,
    Replied,
}

text_enum!(MessageStatus, "message status", {
    Unread => "unread",
    Read => "read",
    Replied => "replied",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
}

text_enum!(MessagePriority, "message priority", {
    Low => "low",
    Normal => "normal",
    High => "high",
});

// =============================================================================
// Admin notifications
// =============================================================================

/// Back-office notification shown in the bell dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminNotification {
    pub id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    /// ID of the document that triggered this notification
    pub related_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    ContactForm,
}

text_enum!(NotificationType, "notification type", {
    ContactForm => "contact_form",
});

// =============================================================================
// Admins
// =============================================================================

/// Back-office account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: String,
    /// Always stored lower-cased
    pub email: String,
    pub display_name: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
}

text_enum!(AdminRole, "admin role", {
    SuperAdmin => "super_admin",
    Admin => "admin",
});

// =============================================================================
// Security events
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SecurityEvent {
    pub id: String,
    pub event_type: String,
    /// Values: info, warning, critical
    pub severity: String,
    pub actor_email: Option<String>,
    pub ip_address: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventType {
    LoginSuccess,
    LoginFailure,
    LoginLocked,
    UserDeleted,
    SettingsChanged,
    PolicyChanged,
}

text_enum!(SecurityEventType, "security event type", {
    LoginSuccess => "login_success",
    LoginFailure => "login_failure",
    LoginLocked => "login_locked",
    UserDeleted => "user_deleted",
    SettingsChanged => "settings_changed",
    PolicyChanged => "policy_changed",
});

impl SecurityEventType {
    pub fn severity(&self) -> Severity {
        match self {
            Self::LoginSuccess | Self::SettingsChanged => Severity::Info,
            Self::LoginFailure | Self::PolicyChanged | Self::UserDeleted => Severity::Warning,
            Self::LoginLocked => Severity::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

text_enum!(Severity, "severity", {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

// =============================================================================
// Site settings
// =============================================================================

/// The singleton settings document
///
/// Stored as one JSON blob and always replaced wholesale. Missing fields
/// fall back to their defaults when read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,
    /// Values: light, dark, system
    pub theme: String,
    pub maintenance_mode: bool,
    pub security: SecuritySettings,
    pub notifications: NotificationSettings,
    pub analytics: AnalyticsSettings,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "AI Tools Hub".to_string(),
            site_description: "Free AI-powered tools for images, documents and writing".to_string(),
            contact_email: "support@example.com".to_string(),
            theme: "system".to_string(),
            maintenance_mode: false,
            security: SecuritySettings::default(),
            notifications: NotificationSettings::default(),
            analytics: AnalyticsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub require_two_factor: bool,
    pub session_timeout_minutes: i64,
    pub max_login_attempts: i64,
    pub lockout_minutes: i64,
    pub password_min_length: i64,
    pub allow_registration: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            require_two_factor: false,
            session_timeout_minutes: 60 * 24,
            max_login_attempts: 5,
            lockout_minutes: 15,
            password_min_length: 8,
            allow_registration: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub contact_form_alerts: bool,
    pub new_user_alerts: bool,
    pub email_digest: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            contact_form_alerts: true,
            new_user_alerts: false,
            email_digest: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub enabled: bool,
    pub tracking_id: Option<String>,
    pub anonymize_ip: bool,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tracking_id: None,
            anonymize_ip: true,
        }
    }
}

impl SiteSettings {
    /// Check field ranges before the document is stored
    pub fn validate(&self) -> Result<(), AppError> {
        if self.site_name.trim().is_empty() {
            return Err(AppError::Validation("site_name cannot be empty".to_string()));
        }
        if !matches!(self.theme.as_str(), "light" | "dark" | "system") {
            return Err(AppError::Validation(format!(
                "invalid theme: {}",
                self.theme
            )));
        }

        let security = &self.security;
        if !(5..=10_080).contains(&security.session_timeout_minutes) {
            return Err(AppError::Validation(
                "session_timeout_minutes must be between 5 and 10080".to_string(),
            ));
        }
        if security.max_login_attempts < 1 {
            return Err(AppError::Validation(
                "max_login_attempts must be at least 1".to_string(),
            ));
        }
        if security.lockout_minutes < 1 {
            return Err(AppError::Validation(
                "lockout_minutes must be at least 1".to_string(),
            ));
        }
        if !(8..=128).contains(&security.password_min_length) {
            return Err(AppError::Validation(
                "password_min_length must be between 8 and 128".to_string(),
            ));
        }

        Ok(())
    }
}
