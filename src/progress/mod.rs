mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn protected_router() -> Router<AppState> {
    handlers::progress_routes()
}
