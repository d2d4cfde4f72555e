//! Admin tool catalog management

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::AppState;
use crate::api::dto::{ActiveToggle, DeleteResponse, PremiumToggle, SeedResponse};
use crate::data::{AiTool, ListParams, Page};
use crate::error::AppError;
use crate::service::{ToolInput, ToolService};

/// Routes:
/// - GET /tools - List tools
/// - POST /tools - Create tool
/// - POST /tools/seed - Seed the default catalog into an empty table
/// - GET /tools/:id - Get tool
/// - PUT /tools/:id - Edit tool
/// - DELETE /tools/:id - Delete tool
/// - POST /tools/:id/active - Enable/disable
/// - POST /tools/:id/premium - Free/premium
pub fn tools_router() -> Router<AppState> {
    Router::new()
        .route("/tools", get(list_tools).post(create_tool))
        .route("/tools/seed", post(seed_tools))
        .route(
            "/tools/:id",
            get(get_tool).put(update_tool).delete(delete_tool),
        )
        .route("/tools/:id/active", post(set_active))
        .route("/tools/:id/premium", post(set_premium))
}

fn service(state: &AppState) -> ToolService {
    ToolService::new(state.db.clone())
}

async fn list_tools(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<AiTool>>, AppError> {
    Ok(Json(service(&state).list(&params).await?))
}

async fn get_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AiTool>, AppError> {
    Ok(Json(service(&state).get(&id).await?))
}

async fn create_tool(
    State(state): State<AppState>,
    Json(input): Json<ToolInput>,
) -> Result<(StatusCode, Json<AiTool>), AppError> {
    let tool = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ToolInput>,
) -> Result<Json<AiTool>, AppError> {
    Ok(Json(service(&state).update(&id, input).await?))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActiveToggle>,
) -> Result<Json<AiTool>, AppError> {
    Ok(Json(service(&state).set_active(&id, body.is_active).await?))
}

async fn set_premium(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PremiumToggle>,
) -> Result<Json<AiTool>, AppError> {
    Ok(Json(service(&state).set_premium(&id, body.is_premium).await?))
}

async fn delete_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    service(&state).delete(&id).await?;
    Ok(Json(DeleteResponse::new(id)))
}

async fn seed_tools(State(state): State<AppState>) -> Result<Json<SeedResponse>, AppError> {
    let inserted = service(&state).seed_defaults().await?;
    Ok(Json(SeedResponse { inserted }))
}
