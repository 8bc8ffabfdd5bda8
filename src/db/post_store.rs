use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::{FileType, Post};

/// Fields assembled by the upload handler once the media collaborator has
/// confirmed the stored file.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Option<Uuid>,
    pub caption: String,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, new_post: NewPost) -> Result<Post, ApiError>;

    /// Every post, ordered by creation time descending.
    async fn all_newest_first(&self) -> Result<Vec<Post>, ApiError>;

    /// Removes the post. Returns `false` when no post had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, new_post: NewPost) -> Result<Post, ApiError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, user_id, caption, url, file_type, file_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, caption, url, file_type, file_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_post.user_id)
        .bind(&new_post.caption)
        .bind(&new_post.url)
        .bind(new_post.file_type)
        .bind(&new_post.file_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn all_newest_first(&self) -> Result<Vec<Post>, ApiError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, caption, url, file_type, file_name, created_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// DashMap-backed variant used when no database is configured. Posts live only
/// as long as the process.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: DashMap<Uuid, Post>,
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, new_post: NewPost) -> Result<Post, ApiError> {
        let post = Post {
            id: Uuid::new_v4(),
            user_id: new_post.user_id,
            caption: new_post.caption,
            url: new_post.url,
            file_type: new_post.file_type,
            file_name: new_post.file_name,
            created_at: Utc::now(),
        };

        self.posts.insert(post.id, post.clone());

        Ok(post)
    }

    async fn all_newest_first(&self) -> Result<Vec<Post>, ApiError> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        // Sort by creation date (newest first)
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(posts)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.posts.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_post(caption: &str) -> NewPost {
        NewPost {
            user_id: None,
            caption: caption.to_string(),
            url: format!("https://cdn.example.com/{caption}.jpg"),
            file_type: FileType::Image,
            file_name: format!("{caption}.jpg"),
        }
    }

    #[tokio::test]
    async fn inserted_posts_come_back_newest_first() {
        let store = MemoryPostStore::default();

        for caption in ["one", "two", "three"] {
            store.insert(new_post(caption)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let posts = store.all_newest_first().await.unwrap();
        let captions: Vec<&str> = posts.iter().map(|p| p.caption.as_str()).collect();
        assert_eq!(captions, ["three", "two", "one"]);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_post() {
        let store = MemoryPostStore::default();
        let first = store.insert(new_post("first")).await.unwrap();
        let second = store.insert(new_post("second")).await.unwrap();

        assert!(store.delete(first.id).await.unwrap());

        let remaining = store.all_newest_first().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_reports_false_and_changes_nothing() {
        let store = MemoryPostStore::default();
        store.insert(new_post("only")).await.unwrap();

        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.all_newest_first().await.unwrap().len(), 1);
    }
}
