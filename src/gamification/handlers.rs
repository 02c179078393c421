use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::repo::{Achievements, Leaderboard, UserStats};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn leaderboard_routes() -> Router<AppState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/achievements", get(get_achievements))
        .route("/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_leaderboard(State(state): State<AppState>) -> AppResult<Json<Leaderboard>> {
    Ok(Json(state.gamification.leaderboard().await?))
}

#[instrument(skip(state))]
pub async fn get_achievements(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Achievements>> {
    Ok(Json(state.gamification.achievements(user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UserStats>> {
    Ok(Json(state.gamification.stats(user_id).await?))
}
