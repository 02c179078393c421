use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::repo::{ChallengeCompletion, ModuleProgressDetail, ProgressOverview};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/progress", get(get_progress))
        .route("/progress/modules/:id", get(get_module_progress))
        .route("/progress/challenges/:id/complete", post(complete_challenge))
}

#[instrument(skip(state))]
pub async fn get_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProgressOverview>> {
    Ok(Json(state.progress.overview(user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_module_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ModuleProgressDetail>> {
    Ok(Json(state.progress.module(user_id, &id).await?))
}

#[instrument(skip(state))]
pub async fn complete_challenge(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ChallengeCompletion>> {
    Ok(Json(state.progress.complete_challenge(user_id, &id).await?))
}
