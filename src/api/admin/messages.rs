//! Admin contact inbox

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::AppState;
use crate::api::dto::{DeleteResponse, PriorityChange, ReplyRequest, StatusChange};
use crate::data::{ContactMessage, ListParams, Page};
use crate::error::AppError;
use crate::service::ContactService;

/// Routes:
/// - GET /messages - List messages
/// - GET /messages/:id - Open message (unread becomes read)
/// - DELETE /messages/:id - Delete message
/// - POST /messages/:id/status - Set status
/// - POST /messages/:id/priority - Set priority
/// - POST /messages/:id/reply - Store a reply
pub fn messages_router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/messages/:id", get(get_message).delete(delete_message))
        .route("/messages/:id/status", post(set_status))
        .route("/messages/:id/priority", post(set_priority))
        .route("/messages/:id/reply", post(reply))
}

fn service(state: &AppState) -> ContactService {
    ContactService::new(state.db.clone(), state.notifications.clone())
}

async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ContactMessage>>, AppError> {
    Ok(Json(service(&state).list(&params).await?))
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>, AppError> {
    Ok(Json(service(&state).open(&id).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusChange>,
) -> Result<Json<ContactMessage>, AppError> {
    Ok(Json(service(&state).set_status(&id, &body.status).await?))
}

async fn set_priority(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PriorityChange>,
) -> Result<Json<ContactMessage>, AppError> {
    Ok(Json(service(&state).set_priority(&id, &body.priority).await?))
}

async fn reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<ContactMessage>, AppError> {
    Ok(Json(service(&state).reply(&id, &body.reply).await?))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    service(&state).delete(&id).await?;
    Ok(Json(DeleteResponse::new(id)))
}
