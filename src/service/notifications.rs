//! Admin notification bell
//!
//! The hub publishes the full unread list through a `watch` channel. Every
//! subscriber sees the latest list on each change, never a diff. The list is
//! capped, so the true unread total travels with it.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::data::{AdminNotification, Database, NotificationType};
use crate::error::AppError;

/// Badge numbers above this render as "9+"
pub const BADGE_CAP: usize = 9;

/// Where the admin UI goes after opening a contact form notification
pub const MESSAGES_ROUTE: &str = "/admin/messages";

/// Newest unread notifications plus the number unread in total
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnreadSnapshot {
    pub total: usize,
    pub notifications: Vec<AdminNotification>,
}

impl UnreadSnapshot {
    pub fn new(total: usize, notifications: Vec<AdminNotification>) -> Self {
        Self {
            total: total.max(notifications.len()),
            notifications,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn badge(&self, dropdown_limit: usize) -> BadgeView {
        BadgeView::new(self.total, &self.notifications, dropdown_limit)
    }
}

pub type UnreadList = Arc<UnreadSnapshot>;

/// What the bell shows for a given unread list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeView {
    /// Total unread notifications
    pub count: usize,
    /// Badge text; `None` hides the badge
    pub label: Option<String>,
    pub display_count: usize,
    /// Dropdown entries, newest first
    pub items: Vec<AdminNotification>,
    /// Unread notifications not shown in the dropdown ("+N more")
    pub remainder: usize,
}

impl BadgeView {
    /// `total` is the full unread count; `list` may hold only the newest of them
    pub fn new(total: usize, list: &[AdminNotification], dropdown_limit: usize) -> Self {
        let count = total.max(list.len());
        let label = match count {
            0 => None,
            n if n > BADGE_CAP => Some(format!("{}+", BADGE_CAP)),
            n => Some(n.to_string()),
        };
        let items: Vec<_> = list.iter().take(dropdown_limit).cloned().collect();
        let remainder = count - items.len();

        Self {
            count,
            label,
            display_count: count.min(BADGE_CAP),
            items,
            remainder,
        }
    }
}

/// Result of clicking a notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenOutcome {
    pub id: String,
    /// Route to navigate to, if the notification type has one
    pub redirect: Option<String>,
    /// The dropdown closes after every click
    pub closed: bool,
}

/// Publish/subscribe hub for the unread notification list
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    tx: watch::Sender<UnreadList>,
    max_unread: usize,
}

impl NotificationHub {
    pub fn new(max_unread: usize) -> Self {
        let (tx, _) = watch::channel(Arc::new(UnreadSnapshot::default()));
        Self {
            inner: Arc::new(HubInner { tx, max_unread }),
        }
    }

    /// Subscribe to list changes. The receiver starts at the current list.
    pub fn subscribe(&self) -> watch::Receiver<UnreadList> {
        self.inner.tx.subscribe()
    }

    pub fn current(&self) -> UnreadList {
        self.inner.tx.borrow().clone()
    }

    /// Replace the published list wholesale
    pub fn publish(&self, snapshot: UnreadSnapshot) -> UnreadList {
        use crate::metrics::{NOTIFICATION_SUBSCRIBERS, UNREAD_NOTIFICATIONS};

        let snapshot = Arc::new(snapshot);
        UNREAD_NOTIFICATIONS.set(snapshot.total as i64);
        NOTIFICATION_SUBSCRIBERS.set(self.inner.tx.receiver_count() as i64);
        self.inner.tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Reload the unread list from the database and publish it
    pub async fn refresh(&self, db: &Database) -> Result<UnreadList, AppError> {
        let list = db.get_unread_notifications(self.inner.max_unread).await?;
        let total = usize::try_from(db.count_unread_notifications().await?).unwrap_or(0);
        tracing::debug!(unread = total, listed = list.len(), "Refreshed notification hub");
        Ok(self.publish(UnreadSnapshot::new(total, list)))
    }
}

/// Notification service
pub struct NotificationService {
    db: Arc<Database>,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(db: Arc<Database>, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Handle a click on one notification
    ///
    /// The read flag is written for that notification only. A failing write
    /// is logged and the click still navigates and closes the dropdown.
    pub async fn open(&self, id: &str) -> Result<OpenOutcome, AppError> {
        let notification = self.db.get_notification(id).await?.ok_or(AppError::NotFound)?;

        if let Err(error) = self.db.mark_notification_read(id).await {
            tracing::warn!(%error, notification_id = %id, "Failed to mark notification read");
        }
        self.refresh_quietly().await;

        let redirect = match notification.notification_type.parse::<NotificationType>() {
            Ok(NotificationType::ContactForm) => Some(MESSAGES_ROUTE.to_string()),
            Err(_) => None,
        };

        Ok(OpenOutcome {
            id: notification.id,
            redirect,
            closed: true,
        })
    }

    /// Mark every notification read
    pub async fn mark_all_read(&self) -> Result<u64, AppError> {
        let changed = self.db.mark_all_notifications_read().await?;
        self.hub.refresh(&self.db).await?;
        tracing::info!(changed, "Marked all notifications read");
        Ok(changed)
    }

    async fn refresh_quietly(&self) {
        if let Err(error) = self.hub.refresh(&self.db).await {
            tracing::warn!(%error, "Failed to refresh notification hub");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn notifications(n: usize) -> Vec<AdminNotification> {
        let base = Utc::now();
        (0..n)
            .map(|i| AdminNotification {
                id: format!("n{i}"),
                notification_type: "contact_form".to_string(),
                title: format!("New message {i}"),
                message: "Hello".to_string(),
                is_read: false,
                related_id: Some(format!("m{i}")),
                created_at: base - Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn badge_hidden_when_nothing_unread() {
        let view = BadgeView::new(0, &[], 5);
        assert_eq!(view.count, 0);
        assert_eq!(view.label, None);
        assert_eq!(view.display_count, 0);
        assert!(view.items.is_empty());
        assert_eq!(view.remainder, 0);
    }

    #[test]
    fn badge_shows_exact_count_up_to_nine() {
        for n in 1..=9 {
            let view = BadgeView::new(n, &notifications(n), 5);
            assert_eq!(view.label, Some(n.to_string()));
            assert_eq!(view.display_count, n);
        }
    }

    #[test]
    fn badge_caps_at_nine_plus() {
        let view = BadgeView::new(12, &notifications(12), 5);
        assert_eq!(view.count, 12);
        assert_eq!(view.label.as_deref(), Some("9+"));
        assert_eq!(view.display_count, 9);
        assert_eq!(view.items.len(), 5);
        assert_eq!(view.remainder, 7);
    }

    #[test]
    fn dropdown_keeps_list_order() {
        let list = notifications(3);
        let view = BadgeView::new(list.len(), &list, 5);
        assert_eq!(view.items, list);
        assert_eq!(view.remainder, 0);
    }

    #[test]
    fn badge_counts_unread_beyond_the_published_list() {
        let view = BadgeView::new(5, &notifications(3), 2);
        assert_eq!(view.count, 5);
        assert_eq!(view.label.as_deref(), Some("5"));
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.remainder, 3);
    }

    #[tokio::test]
    async fn subscribers_receive_full_replacement_lists() {
        let hub = NotificationHub::new(100);
        let mut rx = hub.subscribe();
        assert!(rx.borrow().is_empty());

        hub.publish(UnreadSnapshot::new(2, notifications(2)));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().notifications.len(), 2);

        hub.publish(UnreadSnapshot::new(1, notifications(1)));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().total, 1);
        assert_eq!(hub.current().total, 1);
    }

    #[tokio::test]
    async fn refresh_keeps_true_total_when_list_is_capped() {
        use crate::data::{ContactMessage, EntityId, MessagePriority, MessageStatus};

        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(&dir.path().join("hub.db")).await.unwrap();
        for (index, note) in notifications(5).into_iter().enumerate() {
            let message = ContactMessage {
                id: EntityId::new().0,
                name: format!("Visitor {index}"),
                email: "visitor@example.com".to_string(),
                subject: "Hi".to_string(),
                message: "Hello".to_string(),
                status: MessageStatus::Unread.as_str().to_string(),
                priority: MessagePriority::Normal.as_str().to_string(),
                reply: None,
                replied_at: None,
                created_at: note.created_at,
                updated_at: note.created_at,
            };
            db.insert_contact_submission(&message, Some(&note)).await.unwrap();
        }

        let hub = NotificationHub::new(3);
        let snapshot = hub.refresh(&db).await.unwrap();
        assert_eq!(snapshot.total, 5);
        assert_eq!(snapshot.notifications.len(), 3);
        assert_eq!(snapshot.notifications[0].id, "n0", "newest first");

        let badge = snapshot.badge(2);
        assert_eq!(badge.count, 5);
        assert_eq!(badge.remainder, 3);
    }
}
