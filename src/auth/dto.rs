use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::AppError;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;
/// RFC 5321 path limit.
pub const EMAIL_MAX_CHARS: usize = 254;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(AppError::Validation(format!(
            "Username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Email must be at most {EMAIL_MAX_CHARS} characters"
        )));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(())
}

fn validate_new_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_CHARS} characters"
        )));
    }
    Ok(())
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Normalises the email and checks field shapes.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_new_password(&self.password)
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.current_password.is_empty() {
            return Err(AppError::Validation("Current password is required".into()));
        }
        validate_new_password(&self.new_password)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        validate_username(&self.username)?;
        validate_email(&self.email)
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub points: i32,
    pub level: i32,
    pub streak: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_streak_day: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            points: u.points,
            level: u.level,
            streak: u.streak,
            last_streak_day: u.last_streak_day,
            created_at: u.created_at,
            last_login_at: u.last_login_at,
        }
    }
}
