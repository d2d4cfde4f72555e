//! Admin API endpoints
//!
//! Back-office endpoints mounted under `/api/admin`.
//! All routes require an admin session.

mod analytics;
mod content;
mod messages;
mod notifications;
mod settings;
mod tools;
mod users;

use axum::{
    Router,
    http::header,
    response::{IntoResponse, Response},
};

use crate::AppState;

pub use notifications::NotificationSnapshot;

/// Create admin router
///
/// Authentication is applied by the top-level router composition.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .merge(users::users_router())
        .merge(content::content_router())
        .merge(tools::tools_router())
        .merge(messages::messages_router())
        .merge(notifications::notifications_router())
        .merge(settings::settings_router())
        .merge(analytics::analytics_router())
}

/// File download response named `{stem}-{date}.{ext}`
pub(crate) fn download(
    stem: &str,
    ext: &str,
    content_type: &'static str,
    body: String,
) -> Response {
    let disposition =
        crate::service::export::attachment_disposition(stem, ext, chrono::Utc::now());
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
