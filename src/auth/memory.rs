use std::collections::HashMap;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{StoreError, UniqueField, UserStore};
use super::repo_types::User;

/// Identity injected by the no-database authorization bypass.
pub const PLACEHOLDER_USER_ID: Uuid = Uuid::nil();

/// In-process credential store for the no-database development mode and tests.
/// Uniqueness checks and writes happen under one write lock.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the development placeholder account.
    pub fn with_placeholder() -> Self {
        let user = placeholder_user();
        let mut users = HashMap::new();
        users.insert(user.id, user);
        Self {
            users: RwLock::new(users),
        }
    }
}

fn placeholder_user() -> User {
    let now = OffsetDateTime::now_utc();
    User {
        id: PLACEHOLDER_USER_ID,
        username: "testuser".into(),
        email: "test@example.com".into(),
        // Not a valid PHC string, so no password ever matches it.
        password_hash: "!".into(),
        points: 100,
        level: 2,
        streak: 3,
        last_streak_day: now - Duration::days(1),
        created_at: now - Duration::days(30),
        last_login_at: now,
    }
}

fn find_conflict(
    users: &HashMap<Uuid, User>,
    exclude: Option<Uuid>,
    username: &str,
    email: &str,
) -> Option<UniqueField> {
    let others = || users.values().filter(move |u| Some(u.id) != exclude);
    if others().any(|u| u.username == username) {
        return Some(UniqueField::Username);
    }
    if others().any(|u| u.email == email) {
        return Some(UniqueField::Email);
    }
    None
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if let Some(field) = find_conflict(&users, None, username, email) {
            return Err(StoreError::Conflict(field));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            points: 0,
            level: 1,
            streak: 0,
            last_streak_day: now,
            created_at: now,
            last_login_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(field) = find_conflict(&users, Some(id), username, email) {
            return Err(StoreError::Conflict(field));
        }
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.username = username.to_string();
        user.email = email.to_string();
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.last_login_at = at;
        Ok(())
    }
}
