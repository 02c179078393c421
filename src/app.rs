use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::auth::extractors::require_auth;
use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, content, gamification, progress};

/// Assembles public and protected route groups under `/api`. The
/// authorization middleware is layered on the protected group only.
pub fn build_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .merge(auth::public_router())
        .merge(content::public_router())
        .merge(gamification::public_router());

    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(progress::protected_router())
        .merge(gamification::protected_router())
        .merge(content::protected_router())
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api", public.merge(protected))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            error!(%status, latency_ms, "response");
                        } else {
                            info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received Ctrl+C, shutting down"),
        _ = terminate => warn!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::PLACEHOLDER_USER_ID;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn read_json(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        if bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = res.status();
        (status, read_json(res).await)
    }

    async fn register(app: &Router, username: &str, email: &str, password: &str) -> StatusCode {
        let body = json!({ "username": username, "email": email, "password": password });
        send(app, Method::POST, "/api/auth/register", None, Some(body)).await.0
    }

    async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
        let body = json!({ "username": username, "password": password });
        send(app, Method::POST, "/api/auth/login", None, Some(body)).await
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn register_login_conflict_scenario() {
        let app = build_app(AppState::fake());

        assert_eq!(
            register(&app, "alice", "alice@example.com", "password123").await,
            StatusCode::CREATED
        );

        let (status, body) = login(&app, "alice", "password123").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["user"]["username"], "alice");
        let raw = body.to_string();
        assert!(!raw.contains("passwordHash"));
        assert!(!raw.contains("password_hash"));
        assert!(!raw.contains("$argon2"));

        let (status, wrong) = login(&app, "alice", "wrongpass").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, unknown) = login(&app, "mallory", "password123").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);

        assert_eq!(
            register(&app, "alice", "other@example.com", "password456").await,
            StatusCode::CONFLICT
        );
        assert_eq!(
            register(&app, "alice2", "alice@example.com", "password456").await,
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn malformed_input_is_bad_request() {
        let app = build_app(AppState::fake());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "al", "email": "al@example.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profile_requires_token() {
        let app = build_app(AppState::fake());
        register(&app, "alice", "alice@example.com", "password123").await;
        let (_, body) = login(&app, "alice", "password123").await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, profile) = send(&app, Method::GET, "/api/auth/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["username"], "alice");
        assert_eq!(profile["email"], "alice@example.com");
        assert_eq!(profile["level"], 1);
        assert!(profile.get("passwordHash").is_none());

        let (status, body) = send(&app, Method::GET, "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header is required");

        let (status, body) =
            send(&app, Method::GET, "/api/auth/profile", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn profile_update_and_password_change() {
        let app = build_app(AppState::fake());
        register(&app, "alice", "alice@example.com", "password123").await;
        register(&app, "bob", "bob@example.com", "password123").await;
        let (_, body) = login(&app, "alice", "password123").await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "username": "bob", "email": "alice@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "username": "alice_w", "email": "alice@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated successfully");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({ "currentPassword": "wrongpass", "newPassword": "password456" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({ "currentPassword": "password123", "newPassword": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({ "currentPassword": "password123", "newPassword": "password456" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(login(&app, "alice_w", "password123").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(login(&app, "alice_w", "password456").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn collaborator_routes_are_gated() {
        let app = build_app(AppState::fake());

        let (status, body) = send(&app, Method::GET, "/api/content/modules", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["modules"].is_array());

        let (status, body) =
            send(&app, Method::GET, "/api/content/challenges/hello", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "hello");

        let (status, body) = send(&app, Method::GET, "/api/leaderboard", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["leaderboard"][0]["rank"], 1);

        for (method, uri) in [
            (Method::GET, "/api/progress"),
            (Method::GET, "/api/progress/modules/basics"),
            (Method::POST, "/api/progress/challenges/c1/complete"),
            (Method::GET, "/api/achievements"),
            (Method::GET, "/api/stats"),
        ] {
            let (status, _) = send(&app, method, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }

        register(&app, "alice", "alice@example.com", "password123").await;
        let (_, body) = login(&app, "alice", "password123").await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, "/api/progress", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["modules"].as_array().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/progress/challenges/c1/complete",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 10);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/execute",
            Some(&token),
            Some(json!({ "code": "package main" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn no_database_mode_bypasses_tokens() {
        let config = AppConfig::from_lookup(|key| (key == "SKIP_DB").then(|| "true".to_string()))
            .expect("config");
        let state = AppState::init(config).await.expect("state");
        let app = build_app(state);

        let (status, body) = send(&app, Method::GET, "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], PLACEHOLDER_USER_ID.to_string());
        assert_eq!(body["username"], "testuser");
    }
}
