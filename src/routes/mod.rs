mod feed;
mod health;
mod post;
mod upload;
mod user;

use axum::{
    Router,
    routing::{delete, get, post as post_route},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Public routes (no auth required)
        .route("/health", get(health::health_check))
        .route("/auth/register", post_route(user::register))
        .route("/auth/jwt/login", post_route(user::login))
        .route("/auth/forgot-password", post_route(user::forgot_password))
        .route("/auth/reset-password", post_route(user::reset_password))
        .route(
            "/auth/request-verify-token",
            post_route(user::request_verify_token),
        )
        .route("/auth/verify", post_route(user::verify_user))
        .route("/feed", get(feed::feed))
        .route("/posts/{post_id}", delete(post::delete_post))
        // Protected routes (auth required)
        .route("/users/me", get(user::me).patch(user::update_me))
        .route("/upload", post_route(upload::upload))
        // Add state and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
