//! Public API endpoints
//!
//! Anonymous endpoints used by the marketing site: the tool catalog, the
//! blog, the contact form and profile sync after sign-in.
//! Writes answer 503 while the site is in maintenance mode.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use super::dto::{LikeResponse, UsageRequest, UsageResponse};
use crate::AppState;
use crate::data::{AiTool, BlogPost, ContactMessage, ListParams, Page, User};
use crate::error::AppError;
use crate::service::{
    ContactService, ContactSubmission, ContentService, ProfileSync, PublicSiteInfo,
    SettingsService, ToolService, UserService,
};

/// Create public API router
///
/// Routes:
/// - GET /site - Site name, theme and maintenance flag
/// - GET /tools - Active tools
/// - POST /tools/:id/usage - Record a tool invocation
/// - GET /blog - Published posts
/// - GET /blog/:id - Read a published post
/// - POST /blog/:id/like - Like a published post
/// - POST /contact - Submit the contact form
/// - POST /users/sync - Sync a signed-in user's profile
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/site", get(site_info))
        .route("/tools", get(list_tools))
        .route("/tools/:id/usage", post(record_usage))
        .route("/blog", get(list_posts))
        .route("/blog/:id", get(read_post))
        .route("/blog/:id/like", post(like_post))
        .route("/contact", post(submit_contact))
        .route("/users/sync", post(sync_user))
}

fn settings(state: &AppState) -> SettingsService {
    SettingsService::new(state.db.clone(), state.settings.clone())
}

async fn site_info(State(state): State<AppState>) -> Result<Json<PublicSiteInfo>, AppError> {
    Ok(Json(settings(&state).public_info().await?))
}

// =============================================================================
// Tools
// =============================================================================

async fn list_tools(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<AiTool>>, AppError> {
    let tools = ToolService::new(state.db.clone())
        .list_active(&params)
        .await?;
    Ok(Json(tools))
}

/// POST /api/tools/:id/usage
///
/// The body is optional; anonymous usage of free tools is allowed.
async fn record_usage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<UsageRequest>>,
) -> Result<Json<UsageResponse>, AppError> {
    settings(&state).ensure_writable().await?;

    let Json(request) = body.unwrap_or_default();
    let usage_count = ToolService::new(state.db.clone())
        .record_usage(&id, request.user_id.as_deref())
        .await?;
    Ok(Json(UsageResponse {
        tool_id: id,
        usage_count,
    }))
}

// =============================================================================
// Blog
// =============================================================================

fn content(state: &AppState) -> ContentService {
    ContentService::new(state.db.clone(), state.storage.clone())
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<BlogPost>>, AppError> {
    Ok(Json(content(&state).list_published(&params).await?))
}

async fn read_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(content(&state).view_published(&id).await?))
}

async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let likes = content(&state).like(&id).await?;
    Ok(Json(LikeResponse { id, likes }))
}

// =============================================================================
// Contact form
// =============================================================================

/// POST /api/contact
async fn submit_contact(
    State(state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Result<(StatusCode, Json<ContactMessage>), AppError> {
    let settings = settings(&state);
    settings.ensure_writable().await?;
    let site = settings.get().await?;

    let message = ContactService::new(state.db.clone(), state.notifications.clone())
        .submit(submission, &site)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

// =============================================================================
// Users
// =============================================================================

/// POST /api/users/sync
async fn sync_user(
    State(state): State<AppState>,
    Json(profile): Json<ProfileSync>,
) -> Result<Json<User>, AppError> {
    settings(&state).ensure_writable().await?;
    Ok(Json(UserService::new(state.db.clone()).sync_profile(profile).await?))
}
