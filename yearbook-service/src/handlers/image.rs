//! Image proxy: relays stored photos from the blob-storage provider so
//! clients never fetch from it directly.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

use crate::services::MediaStorage;
use crate::AppState;

/// Relay a stored image with its provider-reported content type
#[utoipa::path(
    get,
    path = "/api/v1/google-image/{id}",
    params(("id" = String, Path, description = "Provider file id")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Image not found")
    ),
    tag = "Images"
)]
pub async fn google_image(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    // Any provider failure reads as "not servable" to the client.
    let (mime_type, bytes) = state.media.fetch(&file_id).await.map_err(|e| {
        tracing::warn!(file_id = %file_id, error = %e, "Image fetch failed");
        AppError::NotFound(anyhow::anyhow!("Image not found"))
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        bytes,
    )
        .into_response())
}
