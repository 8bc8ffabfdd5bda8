use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;
use uuid::Uuid;

use crate::{dto::DeleteResponse, errors::ApiError, state::AppState};

/// DELETE /posts/{post_id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let post_id = Uuid::parse_str(&post_id)
        .map_err(|e| ApiError::Validation(format!("Invalid post id: {}", e)))?;

    if !state.posts.delete(post_id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Post deleted: {}", post_id);

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Post {} deleted", post_id),
    }))
}
