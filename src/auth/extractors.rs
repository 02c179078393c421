use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Authenticated identity handed to protected handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Require and verify a bearer token.
    Enforce,
    /// No-database development mode: every request is the placeholder identity.
    Bypass(Uuid),
}

/// Verifies bearer tokens for the protected route group.
#[derive(Clone)]
pub struct AuthGate {
    keys: JwtKeys,
    mode: AuthMode,
}

impl AuthGate {
    pub fn new(keys: JwtKeys, mode: AuthMode) -> Self {
        Self { keys, mode }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AppError> {
        if let AuthMode::Bypass(placeholder) = self.mode {
            debug!("authorization bypassed (no-database mode)");
            return Ok(AuthUser(placeholder));
        }

        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AppError::Unauthorized("Authorization header is required"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(parse_bearer)
            .ok_or(AppError::Unauthorized("Invalid authorization format"))?;

        let claims = self.keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser(claims.user_id))
    }
}

/// Accepts exactly `Bearer <token>`.
fn parse_bearer(value: &str) -> Option<&str> {
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Route-layer middleware for the protected group. Rejected requests never
/// reach the handler.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = gate.authenticate(req.headers())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthGate: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already verified by `require_auth` on this request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }
        AuthGate::from_ref(state).authenticate(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JwtConfig, TOKEN_TTL_MINUTES};
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "gogog".into(),
            ttl_minutes: TOKEN_TTL_MINUTES,
        })
    }

    fn protected_app(gate: AuthGate, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(move |AuthUser(id): AuthUser| {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        id.to_string()
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(gate.clone(), require_auth))
            .with_state(gate)
    }

    async fn call(app: Router, auth: Option<String>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let res = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn bearer_format() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer a b"), None);
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("abc.def.ghi"), None);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_identity() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let app = protected_app(AuthGate::new(keys, AuthMode::Enforce), hits.clone());

        let (status, body) = call(app, Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_requests_never_reach_handler() {
        let keys = keys();
        let hits = Arc::new(AtomicUsize::new(0));
        let gate = AuthGate::new(keys, AuthMode::Enforce);

        for auth in [
            None,
            Some("Token abc".to_string()),
            Some("Bearer not-a-jwt".to_string()),
        ] {
            let (status, _) = call(protected_app(gate.clone(), hits.clone()), auth).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verification_failures_share_one_message() {
        let gate = AuthGate::new(keys(), AuthMode::Enforce);
        let foreign = JwtKeys::new(&JwtConfig {
            secret: "other-secret".into(),
            issuer: "gogog".into(),
            ttl_minutes: TOKEN_TTL_MINUTES,
        })
        .issue(Uuid::new_v4())
        .unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let (_, forged) = call(
            protected_app(gate.clone(), hits.clone()),
            Some(format!("Bearer {foreign}")),
        )
        .await;
        let (_, garbage) = call(protected_app(gate, hits), Some("Bearer x.y.z".into())).await;
        assert_eq!(forged, garbage);
    }

    #[tokio::test]
    async fn bypass_injects_placeholder() {
        let hits = Arc::new(AtomicUsize::new(0));
        let gate = AuthGate::new(keys(), AuthMode::Bypass(Uuid::nil()));
        let (status, body) = call(protected_app(gate, hits), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Uuid::nil().to_string());
    }

    #[tokio::test]
    async fn extractor_verifies_without_middleware() {
        let gate = AuthGate::new(keys(), AuthMode::Enforce);
        let app = Router::new()
            .route("/whoami", get(|AuthUser(id): AuthUser| async move { id.to_string() }))
            .with_state(gate);
        let (status, _) = call(app, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
