use axum::{Json, extract::State};

use crate::{dto::FeedResponse, errors::ApiError, state::AppState};

/// GET /feed
/// Response: { "posts": [...] }, every post, newest first.
pub async fn feed(State(state): State<AppState>) -> Result<Json<FeedResponse>, ApiError> {
    let posts = state.posts.all_newest_first().await?;

    Ok(Json(FeedResponse { posts }))
}
