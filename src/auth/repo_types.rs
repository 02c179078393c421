use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record owned by the credential store.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                       // immutable once assigned
    pub username: String,               // unique, case-sensitive
    pub email: String,                  // unique, stored lower-cased
    pub password_hash: String,          // Argon2 PHC string, never exposed
    pub points: i32,
    pub level: i32,
    pub streak: i32,
    pub last_streak_day: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub last_login_at: OffsetDateTime,
}
