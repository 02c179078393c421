use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Registration and login; no token required.
pub fn public_router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Profile and password routes; mounted behind the authorization middleware.
pub fn protected_router() -> Router<AppState> {
    handlers::profile_routes()
}
