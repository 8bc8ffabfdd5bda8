mod post_store;
mod user_store;

pub use post_store::{MemoryPostStore, NewPost, PgPostStore, PostStore};
pub use user_store::{MemoryUserStore, NewUser, PgUserStore, UserStore};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connects to Postgres and brings the schema up to date.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
