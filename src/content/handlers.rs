use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, instrument};

use super::repo::{ChallengeDetail, ExecuteRequest, ExecutionResult, ModuleDetail, ModuleList};
use crate::{
    auth::extractors::AuthUser, error::AppResult, extract::ApiJson, state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/content/modules", get(list_modules))
        .route("/content/modules/:id", get(get_module))
        .route("/content/challenges/:id", get(get_challenge))
}

pub fn execute_routes() -> Router<AppState> {
    Router::new().route("/execute", post(execute_code))
}

#[instrument(skip(state))]
pub async fn list_modules(State(state): State<AppState>) -> AppResult<Json<ModuleList>> {
    Ok(Json(state.content.list_modules().await?))
}

#[instrument(skip(state))]
pub async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ModuleDetail>> {
    Ok(Json(state.content.module(&id).await?))
}

#[instrument(skip(state))]
pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ChallengeDetail>> {
    Ok(Json(state.content.challenge(&id).await?))
}

#[instrument(skip(state, payload))]
pub async fn execute_code(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ExecuteRequest>,
) -> AppResult<Json<ExecutionResult>> {
    debug!(%user_id, code_len = payload.code.len(), "execute requested");
    Ok(Json(state.runner.run(user_id, &payload.code).await?))
}
