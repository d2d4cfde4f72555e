//! Dashboard analytics endpoints

use axum::{Json, Router, extract::State, response::Response, routing::get};

use super::download;
use crate::AppState;
use crate::error::AppError;
use crate::service::{AnalyticsReport, AnalyticsService};

/// Routes:
/// - GET /analytics - Aggregated dashboard numbers
/// - GET /analytics/export - Same report as a JSON download
pub fn analytics_router() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(report))
        .route("/analytics/export", get(export_report))
}

async fn report(State(state): State<AppState>) -> Result<Json<AnalyticsReport>, AppError> {
    Ok(Json(AnalyticsService::new(state.db.clone()).report().await?))
}

async fn export_report(State(state): State<AppState>) -> Result<Response, AppError> {
    let report = AnalyticsService::new(state.db.clone()).report().await?;
    let body = serde_json::to_string_pretty(&report).map_err(|e| AppError::Internal(e.into()))?;
    Ok(download("analytics", "json", "application/json", body))
}
