use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::error;
use uuid::Uuid;

use cartelera_types::api::{Claims, UploadResponse};
use cartelera_types::models::{MediaFile, MediaKind};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::validation::{IMAGE_EXTENSIONS, MAX_MEDIA_BYTES, acceptable_image};

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original filename, used for the extension fallback check
    pub name: String,
}

/// POST /media?name={filename} — accepts raw image bytes, saves under the
/// media dir, returns the attachment descriptor to embed in an event.
pub async fn upload_media(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let _ = claims; // any authenticated user may upload

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("empty upload"));
    }
    if bytes.len() > MAX_MEDIA_BYTES {
        return Err(ApiError::BadRequest("attachment exceeds the 8 MB limit"));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !acceptable_image(content_type, &query.name) {
        return Err(ApiError::BadRequest("only image attachments are accepted"));
    }

    let ext = query
        .name
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| "jpg".to_string());
    let object_name = format!("{}.{}", Uuid::new_v4(), ext);

    tokio::fs::create_dir_all(&state.media_dir).await.map_err(|e| {
        error!("Failed to create media directory: {}", e);
        ApiError::Internal(e.into())
    })?;

    let file_path = state.media_dir.join(&object_name);
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        error!("Failed to create {}: {}", file_path.display(), e);
        ApiError::Internal(e.into())
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write {}: {}", file_path.display(), e);
        ApiError::Internal(e.into())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            media: MediaFile {
                id: object_name.clone(),
                kind: MediaKind::Image,
                url: format!("/media/{object_name}"),
            },
        }),
    ))
}

/// GET /media/{id} — serves a stored attachment.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(object_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Object names are {uuid}.{ext}; anything else is a traversal attempt
    let (stem, ext) = object_name
        .split_once('.')
        .ok_or(ApiError::BadRequest("invalid media id"))?;
    stem.parse::<Uuid>()
        .map_err(|_| ApiError::BadRequest("invalid media id"))?;
    if !IMAGE_EXTENSIONS.contains(&ext) {
        return Err(ApiError::BadRequest("invalid media id"));
    }

    let file_path = state.media_dir.join(&object_name);
    let bytes = tokio::fs::read(&file_path)
        .await
        .map_err(|_| ApiError::NotFound("media"))?;

    Ok(([(header::CONTENT_TYPE, mime_for(ext))], bytes))
}

fn mime_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}
