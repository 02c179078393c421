//! HTTP error taxonomy shared by every handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::repo::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (409).
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials or token (401). The message is generic
    /// on purpose and never says which factor failed.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Referenced record absent (404).
    #[error("{0}")]
    NotFound(&'static str),

    /// Store or hashing failure (500). Rendered opaquely.
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized("Invalid credentials")
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal(e) => tracing::error!(error = ?e, "request failed"),
            AppError::Unauthorized(msg) => tracing::warn!(%msg, "unauthorized"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("User not found"),
            StoreError::Conflict(field) => AppError::Conflict(format!("{field} already exists")),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (self.status_code(), Json(json!({ "error": message }))).into_response()
    }
}
