use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{
    dto::{
        ChangePasswordRequest, LoginRequest, LoginResponse, PublicUser, RegisterRequest,
        UpdateProfileRequest,
    },
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking, DUMMY_PASSWORD_HASH},
    repo::{StoreError, UniqueField, UserStore},
    repo_types::User,
};
use crate::error::{AppError, AppResult};

fn conflict(field: UniqueField) -> AppError {
    AppError::Conflict(format!("{field} already exists"))
}

/// A verified token whose user has since disappeared is treated as an
/// invalid session on mutating routes.
fn stale_session() -> AppError {
    AppError::Unauthorized("Invalid or expired token")
}

fn session_or_store(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => stale_session(),
        other => other.into(),
    }
}

/// Registration, login and credential/profile mutation.
///
/// Stateless across requests; every step of a single call runs in order
/// (validate, lookup, hash/verify, persist).
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[cfg(test)]
    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn register(&self, mut req: RegisterRequest) -> AppResult<User> {
        req.validate()?;

        // Cheap pre-checks; the store's own constraint is authoritative.
        if self.users.find_by_username(&req.username).await?.is_some() {
            warn!(username = %req.username, "username already registered");
            return Err(conflict(UniqueField::Username));
        }
        if self.users.find_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Err(conflict(UniqueField::Email));
        }

        let hash = hash_password_blocking(req.password).await?;
        let user = self.users.create(&req.username, &req.email, &hash).await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<LoginResponse> {
        req.validate()?;

        let Some(mut user) = self.users.find_by_username(&req.username).await? else {
            // Same Argon2 work as a wrong password.
            verify_password_blocking(req.password, DUMMY_PASSWORD_HASH.to_string()).await?;
            warn!("login with unknown username");
            return Err(AppError::invalid_credentials());
        };

        if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login with invalid password");
            return Err(AppError::invalid_credentials());
        }

        let now = OffsetDateTime::now_utc();
        match self.users.touch_last_login(user.id, now).await {
            Ok(()) => user.last_login_at = now,
            Err(e) => warn!(error = %e, user_id = %user.id, "update last_login_at failed; continuing"),
        }

        let token = self.keys.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<PublicUser> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(AppError::NotFound("User not found"))
    }

    /// Existing tokens stay valid until they expire.
    pub async fn change_password(&self, user_id: Uuid, req: ChangePasswordRequest) -> AppResult<()> {
        req.validate()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(stale_session)?;

        if !verify_password_blocking(req.current_password, user.password_hash).await? {
            warn!(%user_id, "password change with wrong current password");
            return Err(AppError::invalid_credentials());
        }

        let hash = hash_password_blocking(req.new_password).await?;
        self.users
            .update_password_hash(user_id, &hash)
            .await
            .map_err(session_or_store)?;

        info!(%user_id, "password changed");
        Ok(())
    }

    pub async fn update_profile(&self, user_id: Uuid, mut req: UpdateProfileRequest) -> AppResult<()> {
        req.validate()?;

        if let Some(other) = self.users.find_by_username(&req.username).await? {
            if other.id != user_id {
                return Err(conflict(UniqueField::Username));
            }
        }
        if let Some(other) = self.users.find_by_email(&req.email).await? {
            if other.id != user_id {
                return Err(conflict(UniqueField::Email));
            }
        }

        self.users
            .update_profile(user_id, &req.username, &req.email)
            .await
            .map_err(session_or_store)?;

        info!(%user_id, "profile updated");
        Ok(())
    }
}
