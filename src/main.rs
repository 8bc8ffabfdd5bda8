// ============================================================================
// MEDIA FEED BACKEND
// ============================================================================

// - User registration/login with password hashing
// - JWT authentication with password-reset and verification flows
// - Media upload staged locally, stored on an ImageKit-compatible CDN
// - Reverse-chronological feed
// - Postgres persistence (in-memory fallback for demos)
// - Structured logging

use std::sync::Arc;

use tracing::info;

use pixfeed::{
    config::Config,
    db::{self, MemoryPostStore, MemoryUserStore, PgPostStore, PgUserStore, PostStore, UserStore},
    media::MediaClient,
    routes,
    state::AppState,
};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();

    let media = Arc::new(MediaClient::new(
        config.media_url_endpoint.clone(),
        config.media_private_key.clone(),
    ));

    let (users, posts): (Arc<dyn UserStore>, Arc<dyn PostStore>) = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url)
                .await
                .expect("Failed to connect to database");
            info!("Database connected, migrations applied");
            (
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgPostStore::new(pool)),
            )
        }
        None => {
            info!("DATABASE_URL not set, falling back to in-memory stores");
            (
                Arc::new(MemoryUserStore::default()),
                Arc::new(MemoryPostStore::default()),
            )
        }
    };

    let state = AppState {
        users,
        posts,
        media,
        jwt_secret: config.jwt_secret.clone(),
        require_auth: config.require_auth,
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();

    info!("Server running on http://{}", config.bind_addr);
    info!("API Endpoints:");
    info!("  GET    /health                     - Health check");
    info!("  POST   /auth/register              - Create account");
    info!("  POST   /auth/jwt/login             - Login (form, bearer token)");
    info!("  POST   /auth/forgot-password       - Request password reset");
    info!("  POST   /auth/reset-password        - Reset password with token");
    info!("  POST   /auth/request-verify-token  - Request verification token");
    info!("  POST   /auth/verify                - Verify account with token");
    info!("  GET    /users/me                   - Get current user (auth)");
    info!("  PATCH  /users/me                   - Update current user (auth)");
    info!("  POST   /upload                     - Upload media, create post");
    info!("  GET    /feed                       - All posts, newest first");
    info!("  DELETE /posts/:id                  - Delete a post");

    axum::serve(listener, app).await.unwrap();
}
