//! Product image upload.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::post,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use kinniku_core::ProductId;

use crate::{
    error::AppError,
    middleware::RequireAdminAuth,
    services::{
        ProductImages, SessionGate, StorageError,
        storage::{ImageUpload, MAX_IMAGE_BYTES, MAX_IMAGES},
    },
    state::AppState,
};

/// Multipart overhead allowed on top of the image bytes.
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

/// Response after a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub images: Vec<String>,
}

/// Build the upload router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/products/{id}/images",
        post(upload_images).layer(DefaultBodyLimit::max(
            MAX_IMAGES * MAX_IMAGE_BYTES + MULTIPART_SLACK_BYTES,
        )),
    )
}

/// Upload images and append them to a product.
///
/// Every file part of the form is treated as an image.
///
/// POST /api/products/{id}/images
#[instrument(skip(_admin, state, session, multipart))]
async fn upload_images(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let storage = state.storage().ok_or(StorageError::NotConfigured)?;

    let gate = SessionGate::new(&session, state.provider(), state.store());
    let principal = gate
        .provider_session()
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        uploads.push(ImageUpload {
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    if uploads.is_empty() {
        return Err(AppError::BadRequest("No image files in request".to_string()));
    }

    let images = ProductImages::new(state.store(), storage)
        .attach(&id, uploads, &principal.id_token)
        .await?;

    Ok(Json(UploadResponse { images }))
}
