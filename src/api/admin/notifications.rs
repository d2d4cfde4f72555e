//! Admin notification bell endpoints
//!
//! The stream endpoint pushes the full unread list over Server-Sent Events
//! every time it changes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use chrono::Utc;
use futures::{Stream, StreamExt as _};
use serde::Serialize;
use tokio_stream::wrappers::WatchStream;

use crate::AppState;
use crate::api::dto::MarkAllReadResponse;
use crate::auth::CurrentUser;
use crate::data::AdminNotification;
use crate::error::AppError;
use crate::service::{BadgeView, NotificationService, OpenOutcome, UnreadSnapshot};

/// Routes:
/// - GET /notifications - Unread list and badge
/// - GET /notifications/stream - SSE feed of the unread list
/// - POST /notifications/read_all - Mark everything read
/// - POST /notifications/:id/open - Click a notification
pub fn notifications_router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_unread))
        .route("/notifications/stream", get(stream_unread))
        .route("/notifications/read_all", post(mark_all_read))
        .route("/notifications/:id/open", post(open_notification))
}

/// Unread list together with what the bell shows for it
#[derive(Debug, Serialize)]
pub struct NotificationSnapshot {
    pub notifications: Vec<AdminNotification>,
    pub badge: BadgeView,
}

impl NotificationSnapshot {
    fn new(unread: &UnreadSnapshot, dropdown_limit: usize) -> Self {
        Self {
            notifications: unread.notifications.clone(),
            badge: unread.badge(dropdown_limit),
        }
    }
}

fn service(state: &AppState) -> NotificationService {
    NotificationService::new(state.db.clone(), state.notifications.clone())
}

/// GET /api/admin/notifications
async fn list_unread(
    State(state): State<AppState>,
) -> Result<Json<NotificationSnapshot>, AppError> {
    let unread = state.notifications.refresh(&state.db).await?;
    Ok(Json(NotificationSnapshot::new(
        &unread,
        state.config.notifications.dropdown_limit,
    )))
}

/// GET /api/admin/notifications/stream
///
/// The first event carries the current list. The stream ends when the
/// session expires or the client goes away.
async fn stream_unread(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let dropdown_limit = state.config.notifications.dropdown_limit;
    let remaining = (session.expires_at - Utc::now())
        .to_std()
        .unwrap_or_default();

    tracing::debug!(admin = %session.email, "Notification stream opened");

    let stream = WatchStream::new(state.notifications.subscribe())
        .map(move |unread| {
            Event::default()
                .event("notifications")
                .json_data(NotificationSnapshot::new(&unread, dropdown_limit))
        })
        .take_until(tokio::time::sleep(remaining));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /api/admin/notifications/:id/open
async fn open_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OpenOutcome>, AppError> {
    Ok(Json(service(&state).open(&id).await?))
}

/// POST /api/admin/notifications/read_all
async fn mark_all_read(
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let marked = service(&state).mark_all_read().await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
