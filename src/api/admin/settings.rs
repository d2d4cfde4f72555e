//! Site settings and security audit endpoints

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    routing::{get, patch},
};

use super::download;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{ListParams, Page, SecurityEvent, SiteSettings};
use crate::error::AppError;
use crate::service::{SecurityPatch, SettingsService, export};

/// Routes:
/// - GET /settings - Current settings
/// - PUT /settings - Replace settings (super admin)
/// - PATCH /settings/security - Toggle security policies (super admin)
/// - GET /security/events - Audit trail
/// - GET /security/events/export - Audit trail as CSV
pub fn settings_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(replace_settings))
        .route("/settings/security", patch(patch_security))
        .route("/security/events", get(list_events))
        .route("/security/events/export", get(export_events))
}

fn service(state: &AppState) -> SettingsService {
    SettingsService::new(state.db.clone(), state.settings.clone())
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SiteSettings>, AppError> {
    let settings = service(&state).get().await?;
    Ok(Json(settings.as_ref().clone()))
}

async fn replace_settings(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(settings): Json<SiteSettings>,
) -> Result<Json<SiteSettings>, AppError> {
    let stored = service(&state).replace(&session, settings).await?;
    Ok(Json(stored.as_ref().clone()))
}

async fn patch_security(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(patch): Json<SecurityPatch>,
) -> Result<Json<SiteSettings>, AppError> {
    let stored = service(&state).patch_security(&session, patch).await?;
    Ok(Json(stored.as_ref().clone()))
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<SecurityEvent>>, AppError> {
    Ok(Json(state.db.list_security_events(&params).await?))
}

/// GET /api/admin/security/events/export
///
/// Honors the same filters as the list, without paging.
async fn export_events(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let events = state.db.get_all_security_events(&params).await?;
    Ok(download(
        "security-events",
        "csv",
        "text/csv; charset=utf-8",
        export::security_events_csv(&events),
    ))
}
