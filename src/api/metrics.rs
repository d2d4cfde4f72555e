//! Prometheus metrics endpoint

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::AppState;
use crate::metrics::{REGISTRY, UNREAD_NOTIFICATIONS};

/// GET /metrics
///
/// Returns all metrics in Prometheus text format. Gauges derived from
/// in-memory state are sampled at scrape time.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    UNREAD_NOTIFICATIONS.set(state.notifications.current().total as i64);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!(%error, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create metrics router
///
/// Authentication is applied by the top-level router composition.
pub fn metrics_router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}
