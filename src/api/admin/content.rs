//! Admin blog management

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{get, post},
};

use crate::AppState;
use crate::api::dto::{DeleteResponse, FeaturedToggle, StatusChange};
use crate::auth::CurrentUser;
use crate::data::{BlogPost, ListParams, Page};
use crate::error::AppError;
use crate::service::{ContentService, PostInput};
use crate::storage::{MAX_IMAGE_BYTES, StoredObject};

/// Routes:
/// - GET /content - List posts
/// - POST /content - Create post
/// - POST /content/images - Upload an image
/// - GET /content/:id - Get post
/// - PUT /content/:id - Edit post
/// - DELETE /content/:id - Delete post
/// - POST /content/:id/status - Draft/publish/archive
/// - POST /content/:id/featured - Feature or unfeature
pub fn content_router() -> Router<AppState> {
    Router::new()
        .route("/content", get(list_posts).post(create_post))
        .route(
            "/content/images",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route(
            "/content/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/content/:id/status", post(set_status))
        .route("/content/:id/featured", post(set_featured))
}

fn service(state: &AppState) -> ContentService {
    ContentService::new(state.db.clone(), state.storage.clone())
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<BlogPost>>, AppError> {
    Ok(Json(service(&state).list(&params).await?))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(service(&state).get(&id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(input): Json<PostInput>,
) -> Result<(axum::http::StatusCode, Json<BlogPost>), AppError> {
    let post = service(&state).create(input, &session.email).await?;
    Ok((axum::http::StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PostInput>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(service(&state).update(&id, input).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusChange>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(service(&state).set_status(&id, &body.status).await?))
}

async fn set_featured(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FeaturedToggle>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(service(&state).set_featured(&id, body.featured).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    service(&state).delete(&id).await?;
    Ok(Json(DeleteResponse::new(id)))
}

/// POST /api/admin/content/images
///
/// Multipart form with a single `file` part.
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StoredObject>, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {}", e)))?
        {
            if data.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(AppError::Validation(format!(
                    "file exceeds maximum size of {} bytes",
                    MAX_IMAGE_BYTES
                )));
            }
            data.extend_from_slice(&chunk);
        }

        let stored = service(&state)
            .upload_image(&filename, data, &content_type)
            .await?;
        return Ok(Json(stored));
    }

    Err(AppError::Validation("file part is required".to_string()))
}
