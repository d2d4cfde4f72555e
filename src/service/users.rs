//! End-user profile service

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::data::{Database, ListParams, Page, SecurityEventType, User, UserRole};
use crate::error::AppError;
use crate::service::SecurityService;

/// Profile pushed by the client after a sign-in with the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSync {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    "password".to_string()
}

/// User service
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create or refresh a profile on sign-in
    ///
    /// New profiles start active, free, with the `user` role. Deactivated
    /// users are refused.
    pub async fn sync_profile(&self, profile: ProfileSync) -> Result<User, AppError> {
        let uid = profile.uid.trim();
        let email = profile.email.trim().to_ascii_lowercase();
        if uid.is_empty() {
            return Err(AppError::Validation("uid is required".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("email is invalid".to_string()));
        }

        if let Some(existing) = self.db.get_user(uid).await? {
            if !existing.is_active {
                tracing::warn!(user_id = %uid, "Deactivated user tried to sign in");
                return Err(AppError::Forbidden);
            }
        }

        let display_name = profile
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let provider = match profile.provider.trim() {
            "" => "password",
            provider => provider,
        };

        let user = self
            .db
            .upsert_user_profile(uid, &email, display_name, provider, Utc::now())
            .await?;
        tracing::debug!(user_id = %user.id, "User profile synced");
        Ok(user)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<User>, AppError> {
        self.db.list_users(params).await
    }

    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        self.db.get_user(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> Result<User, AppError> {
        let user = self
            .db
            .set_user_active(id, is_active)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(user_id = %id, is_active, "User status changed");
        Ok(user)
    }

    pub async fn set_premium(&self, id: &str, is_premium: bool) -> Result<User, AppError> {
        let user = self
            .db
            .set_user_premium(id, is_premium)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(user_id = %id, is_premium, "User plan changed");
        Ok(user)
    }

    pub async fn set_role(&self, id: &str, role: &str) -> Result<User, AppError> {
        let role = role.parse::<UserRole>()?;
        let user = self
            .db
            .set_user_role(id, role)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(user_id = %id, role = %role, "User role changed");
        Ok(user)
    }

    /// Delete a user together with their tool usage history
    pub async fn delete(&self, id: &str, actor_email: &str) -> Result<u64, AppError> {
        let removed_usage = self
            .db
            .delete_user_cascade(id)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(user_id = %id, removed_usage, "User deleted");
        SecurityService::new(self.db.clone())
            .record_quietly(
                SecurityEventType::UserDeleted,
                Some(actor_email),
                None,
                format!("Deleted user {id} and {removed_usage} tool usage records"),
            )
            .await;

        Ok(removed_usage)
    }

    pub async fn export_csv(&self) -> Result<String, AppError> {
        let users = self.db.get_all_users().await?;
        Ok(super::export::users_csv(&users))
    }
}
