use std::sync::Arc;

use crate::db::{PostStore, UserStore};
use crate::media::MediaClient;

/// Shared application state. Every collaborator is constructed once at
/// startup and injected here; handlers never reach for globals.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub media: Arc<MediaClient>,
    pub jwt_secret: String,
    /// When false (demo mode) uploads are accepted without a bearer token and
    /// the resulting posts have no owner.
    pub require_auth: bool,
}
