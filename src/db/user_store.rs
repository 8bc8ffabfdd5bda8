use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::User;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `EmailTaken` when the email is already registered.
    async fn insert(&self, new_user: NewUser) -> Result<User, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn update_email(&self, id: Uuid, email: &str) -> Result<Option<User>, ApiError>;

    async fn update_password(
        &self,
        id: Uuid,
        hashed_password: &str,
    ) -> Result<Option<User>, ApiError>;

    async fn mark_verified(&self, id: Uuid) -> Result<Option<User>, ApiError>;
}

const USER_COLUMNS: &str = "id, email, hashed_password, is_active, is_verified, created_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, ApiError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, hashed_password, is_active, is_verified, created_at)
            VALUES ($1, $2, $3, TRUE, FALSE, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::EmailTaken),
            Err(other) => Err(other.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_email(&self, id: Uuid, email: &str) -> Result<Option<User>, ApiError> {
        let result = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::EmailTaken),
            Err(other) => Err(other.into()),
        }
    }

    async fn update_password(
        &self,
        id: Uuid,
        hashed_password: &str,
    ) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET hashed_password = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(hashed_password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_verified = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// DashMap-backed variant used when no database is configured.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    email_index: DashMap<String, Uuid>, // Quick lookup by email
}

impl MemoryUserStore {
    fn with_user<F>(&self, id: Uuid, apply: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut entry = self.users.get_mut(&id)?;
        apply(entry.value_mut());
        Some(entry.value().clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, ApiError> {
        if self.email_index.contains_key(&new_user.email) {
            return Err(ApiError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            hashed_password: new_user.hashed_password,
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
        };

        self.email_index.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let Some(id) = self.email_index.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn update_email(&self, id: Uuid, email: &str) -> Result<Option<User>, ApiError> {
        if let Some(existing) = self.email_index.get(email) {
            if *existing.value() != id {
                return Err(ApiError::EmailTaken);
            }
        }

        let Some(previous) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        self.email_index.remove(&previous.email);
        self.email_index.insert(email.to_string(), id);

        Ok(self.with_user(id, |user| user.email = email.to_string()))
    }

    async fn update_password(
        &self,
        id: Uuid,
        hashed_password: &str,
    ) -> Result<Option<User>, ApiError> {
        Ok(self.with_user(id, |user| user.hashed_password = hashed_password.to_string()))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.with_user(id, |user| user.is_verified = true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: "$2b$12$hash".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.insert(new_user("a@b.com")).await.unwrap();

        assert!(matches!(
            store.insert(new_user("a@b.com")).await,
            Err(ApiError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn new_users_are_active_and_unverified() {
        let store = MemoryUserStore::default();
        let user = store.insert(new_user("a@b.com")).await.unwrap();

        assert!(user.is_active);
        assert!(!user.is_verified);
    }

    #[tokio::test]
    async fn update_email_moves_the_index() {
        let store = MemoryUserStore::default();
        let user = store.insert(new_user("old@b.com")).await.unwrap();

        store.update_email(user.id, "new@b.com").await.unwrap();

        assert!(store.find_by_email("old@b.com").await.unwrap().is_none());
        let found = store.find_by_email("new@b.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn update_email_rejects_taken_address() {
        let store = MemoryUserStore::default();
        store.insert(new_user("a@b.com")).await.unwrap();
        let other = store.insert(new_user("c@d.com")).await.unwrap();

        assert!(matches!(
            store.update_email(other.id, "a@b.com").await,
            Err(ApiError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn mark_verified_flips_the_flag() {
        let store = MemoryUserStore::default();
        let user = store.insert(new_user("a@b.com")).await.unwrap();

        let updated = store.mark_verified(user.id).await.unwrap().unwrap();
        assert!(updated.is_verified);
    }

    #[tokio::test]
    async fn updates_on_unknown_user_return_none() {
        let store = MemoryUserStore::default();
        assert!(store.mark_verified(Uuid::new_v4()).await.unwrap().is_none());
        assert!(
            store
                .update_password(Uuid::new_v4(), "x")
                .await
                .unwrap()
                .is_none()
        );
    }
}
