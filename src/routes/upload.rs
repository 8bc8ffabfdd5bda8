use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
};
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::validate_token,
    db::NewPost,
    errors::ApiError,
    models::{FileType, Post},
    state::AppState,
};

/// POST /upload
/// Multipart form: `file` (required), `caption` (optional, default empty)
/// Headers: Authorization: Bearer <token> (unless auth is disabled)
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let user_id = if state.require_auth {
        let claims = validate_token(&headers, &state.jwt_secret)?;
        Some(Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?)
    } else {
        None
    };

    let mut file: Option<(String, String, Bytes)> = None;
    let mut caption = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::Validation("file field has no filename".into()))?;
                let content_type = field.content_type().map(str::to_string).unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, content_type, data));
            }
            Some("caption") => {
                caption = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read caption: {}", e)))?;
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| ApiError::Validation("file field is required".into()))?;

    // Stage the bytes on local disk while the CDN call is in flight. The file
    // is uniquely named and removed when `staged` drops, on every exit path.
    let staged = stage(&data).await?;
    let staged_bytes = tokio::fs::read(staged.path())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read staged upload: {}", e)))?;

    let stored = state.media.upload(staged_bytes.into(), &file_name).await?;

    let post = state
        .posts
        .insert(NewPost {
            user_id,
            caption,
            url: stored.url,
            file_type: FileType::from_content_type(&content_type),
            file_name: stored.name,
        })
        .await?;

    info!("Post created: {} (media {})", post.id, stored.file_id);

    Ok((StatusCode::CREATED, Json(post)))
}

/// Writes the uploaded bytes to a uniquely named temporary file.
async fn stage(data: &[u8]) -> Result<NamedTempFile, ApiError> {
    let staged = NamedTempFile::new()
        .map_err(|e| ApiError::Internal(format!("Failed to create staging file: {}", e)))?;

    tokio::fs::write(staged.path(), data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;

    Ok(staged)
}
