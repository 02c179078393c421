mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn public_router() -> Router<AppState> {
    handlers::leaderboard_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::user_routes()
}
