//! Admin user management

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};

use super::download;
use crate::AppState;
use crate::api::dto::{ActiveToggle, PremiumToggle, RoleChange, UserDeleteResponse};
use crate::auth::CurrentUser;
use crate::data::{ListParams, Page, User};
use crate::error::AppError;
use crate::service::UserService;

/// Routes:
/// - GET /users - List users
/// - GET /users/export - CSV export
/// - GET /users/:id - Get user
/// - DELETE /users/:id - Delete user and usage history
/// - POST /users/:id/status - Activate/deactivate
/// - POST /users/:id/premium - Change plan
/// - POST /users/:id/role - Change role
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/export", get(export_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/status", post(set_status))
        .route("/users/:id/premium", post(set_premium))
        .route("/users/:id/role", post(set_role))
}

fn service(state: &AppState) -> UserService {
    UserService::new(state.db.clone())
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<User>>, AppError> {
    Ok(Json(service(&state).list(&params).await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(service(&state).get(&id).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActiveToggle>,
) -> Result<Json<User>, AppError> {
    Ok(Json(service(&state).set_active(&id, body.is_active).await?))
}

async fn set_premium(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PremiumToggle>,
) -> Result<Json<User>, AppError> {
    Ok(Json(service(&state).set_premium(&id, body.is_premium).await?))
}

async fn set_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RoleChange>,
) -> Result<Json<User>, AppError> {
    Ok(Json(service(&state).set_role(&id, &body.role).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserDeleteResponse>, AppError> {
    let removed_usage = service(&state).delete(&id, &session.email).await?;
    Ok(Json(UserDeleteResponse {
        id,
        deleted: true,
        removed_usage,
    }))
}

/// GET /api/admin/users/export
async fn export_users(State(state): State<AppState>) -> Result<Response, AppError> {
    let csv = service(&state).export_csv().await?;
    Ok(download("users", "csv", "text/csv; charset=utf-8", csv))
}
