use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            RegisterRequest, UpdateProfileRequest,
        },
        extractors::AuthUser,
        services::AuthService,
    },
    error::AppResult,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/profile", get(get_profile).put(update_profile))
        .route("/auth/password", put(change_password))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    auth.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully",
        }),
    ))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(auth.login(payload).await?))
}

#[instrument(skip(auth))]
pub async fn get_profile(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(auth.profile(user_id).await?))
}

#[instrument(skip(auth, payload))]
pub async fn update_profile(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth.update_profile(user_id, payload).await?;
    Ok(Json(MessageResponse {
        message: "Profile updated successfully",
    }))
}

#[instrument(skip(auth, payload))]
pub async fn change_password(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth.change_password(user_id, payload).await?;
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
