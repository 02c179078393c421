use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Column whose uniqueness constraint was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Username => f.write_str("Username"),
            UniqueField::Email => f.write_str("Email"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(UniqueField),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistent mapping of user identity to credentials and profile.
///
/// `create` and `update_profile` must enforce username/email uniqueness
/// atomically; callers' pre-checks are only an optimisation.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
    async fn update_profile(&self, id: Uuid, username: &str, email: &str)
        -> Result<(), StoreError>;
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), StoreError>;
}

/// PostgreSQL-backed credential store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_key";

/// Maps a unique violation on the `users` keys to the offending field.
fn map_write_err(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            match db_err.constraint() {
                Some(USERNAME_KEY) => return StoreError::Conflict(UniqueField::Username),
                Some(EMAIL_KEY) => return StoreError::Conflict(UniqueField::Email),
                _ => {}
            }
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, points, level, streak,
                   last_streak_day, created_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, points, level, streak,
                   last_streak_day, created_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, points, level, streak,
                   last_streak_day, created_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, points, level, streak,
                      last_streak_day, created_at, last_login_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_err)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET username = $1, email = $2 WHERE id = $3")
            .bind(username)
            .bind(email)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
