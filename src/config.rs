use std::env;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// When unset the server runs with in-memory stores.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub media_private_key: String,
    pub media_url_endpoint: String,
    pub require_auth: bool,
}

impl Config {
    /// Reads configuration from the process environment. Call after
    /// `dotenvy::dotenv()` so a local `.env` file is honored.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            jwt_secret: env::var("SECRET").expect("SECRET must be set!"),
            media_private_key: env::var("IMAGEKIT_PRIVATE_KEY")
                .expect("IMAGEKIT_PRIVATE_KEY must be set!"),
            media_url_endpoint: env::var("IMAGEKIT_URL_ENDPOINT")
                .expect("IMAGEKIT_URL_ENDPOINT must be set!"),
            require_auth: env::var("REQUIRE_AUTH")
                .map(|v| !matches!(v.as_str(), "false" | "0"))
                .unwrap_or(true),
        }
    }
}
