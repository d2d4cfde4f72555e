//! Contact form and admin inbox

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::data::{
    AdminNotification, ContactMessage, Database, EntityId, ListParams, MessagePriority,
    MessageStatus, NotificationType, Page, SiteSettings,
};
use crate::error::AppError;
use crate::service::notifications::NotificationHub;

/// Public contact form body
#[derive(Debug, Clone, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactSubmission {
    /// Trim every field and check that all are present
    fn validate(self) -> Result<Self, AppError> {
        let submission = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        };

        for (field, value) in [
            ("name", &submission.name),
            ("email", &submission.email),
            ("subject", &submission.subject),
            ("message", &submission.message),
        ] {
            if value.is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        if !is_plausible_email(&submission.email) {
            return Err(AppError::Validation("email is invalid".to_string()));
        }

        Ok(submission)
    }
}

/// Something before the `@`, and a dot inside the domain
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// `high` when the sender calls the request urgent
pub fn triage_priority(subject: &str, message: &str) -> MessagePriority {
    let urgent = |text: &str| text.to_lowercase().contains("urgent");
    if urgent(subject) || urgent(message) {
        MessagePriority::High
    } else {
        MessagePriority::Normal
    }
}

/// Contact service
pub struct ContactService {
    db: Arc<Database>,
    hub: NotificationHub,
}

impl ContactService {
    pub fn new(db: Arc<Database>, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Store a contact form submission
    ///
    /// The message and its admin notification are written in one
    /// transaction. No notification is created when contact alerts are
    /// turned off in the site settings.
    pub async fn submit(
        &self,
        submission: ContactSubmission,
        settings: &SiteSettings,
    ) -> Result<ContactMessage, AppError> {
        let submission = submission.validate()?;
        let now = Utc::now();
        let priority = triage_priority(&submission.subject, &submission.message);

        let message = ContactMessage {
            id: EntityId::new().0,
            name: submission.name,
            email: submission.email,
            subject: submission.subject,
            message: submission.message,
            status: MessageStatus::Unread.as_str().to_string(),
            priority: priority.as_str().to_string(),
            reply: None,
            replied_at: None,
            created_at: now,
            updated_at: now,
        };

        let notification = settings
            .notifications
            .contact_form_alerts
            .then(|| AdminNotification {
                id: EntityId::new().0,
                notification_type: NotificationType::ContactForm.as_str().to_string(),
                title: format!("New message from {}", message.name),
                message: message.subject.clone(),
                is_read: false,
                related_id: Some(message.id.clone()),
                created_at: now,
            });

        self.db
            .insert_contact_submission(&message, notification.as_ref())
            .await?;
        crate::metrics::CONTACT_SUBMISSIONS_TOTAL.inc();

        tracing::info!(
            message_id = %message.id,
            priority = %message.priority,
            notified = notification.is_some(),
            "Contact message received"
        );

        if notification.is_some() {
            if let Err(error) = self.hub.refresh(&self.db).await {
                tracing::warn!(%error, "Failed to refresh notification hub");
            }
        }

        Ok(message)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<ContactMessage>, AppError> {
        self.db.list_messages(params).await
    }

    /// Open a message; an unread message becomes read
    pub async fn open(&self, id: &str) -> Result<ContactMessage, AppError> {
        self.db.mark_message_read_if_unread(id, Utc::now()).await?;
        self.db.get_message(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn set_status(&self, id: &str, status: &str) -> Result<ContactMessage, AppError> {
        let status = status.parse::<MessageStatus>()?;
        self.db
            .set_message_status(id, status, Utc::now())
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn set_priority(&self, id: &str, priority: &str) -> Result<ContactMessage, AppError> {
        let priority = priority.parse::<MessagePriority>()?;
        self.db
            .set_message_priority(id, priority, Utc::now())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Store the admin's reply; nothing is sent to the sender
    pub async fn reply(&self, id: &str, reply: &str) -> Result<ContactMessage, AppError> {
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AppError::Validation("reply is required".to_string()));
        }

        let message = self
            .db
            .reply_to_message(id, reply, Utc::now())
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(message_id = %id, "Contact message replied");
        Ok(message)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.db.delete_message(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(message_id = %id, "Contact message deleted");
        Ok(())
    }
}
