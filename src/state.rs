use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::auth::{
    extractors::{AuthGate, AuthMode},
    jwt::JwtKeys,
    memory::{MemoryUserStore, PLACEHOLDER_USER_ID},
    repo::{PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::content::repo::{CodeRunner, ContentRepository, StaticContent, StubRunner};
use crate::gamification::repo::{GamificationRepository, StaticGamification};
use crate::progress::repo::{ProgressRepository, StaticProgress};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Option<PgPool>,
    pub auth: AuthService,
    pub gate: AuthGate,
    pub content: Arc<dyn ContentRepository>,
    pub runner: Arc<dyn CodeRunner>,
    pub progress: Arc<dyn ProgressRepository>,
    pub gamification: Arc<dyn GamificationRepository>,
}

impl AppState {
    /// Connects the credential store described by `config`.
    ///
    /// The authorization bypass is only ever selected together with the
    /// in-memory store, so a configured database always enforces tokens.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        match &config.database {
            Some(db_cfg) => {
                let db = PgPoolOptions::new()
                    .max_connections(db_cfg.max_connections)
                    .max_lifetime(db_cfg.max_lifetime)
                    .connect_with(db_cfg.connect.clone())
                    .await
                    .context("connect to database")?;
                info!("connected to database");
                let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
                let mut state = Self::from_parts(config, users, AuthMode::Enforce);
                state.db = Some(db);
                Ok(state)
            }
            None => {
                warn!("SKIP_DB set: in-memory credential store and authorization bypass enabled");
                let users = Arc::new(MemoryUserStore::with_placeholder()) as Arc<dyn UserStore>;
                Ok(Self::from_parts(
                    config,
                    users,
                    AuthMode::Bypass(PLACEHOLDER_USER_ID),
                ))
            }
        }
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>, mode: AuthMode) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            auth: AuthService::new(users, keys.clone()),
            gate: AuthGate::new(keys, mode),
            config,
            db: None,
            content: Arc::new(StaticContent),
            runner: Arc::new(StubRunner),
            progress: Arc::new(StaticProgress),
            gamification: Arc::new(StaticGamification),
        }
    }

    /// In-memory state that enforces tokens. Used by tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".into()),
            "SKIP_DB" => Some("true".into()),
            _ => None,
        })
        .expect("test config");
        Self::from_parts(
            Arc::new(config),
            Arc::new(MemoryUserStore::new()),
            AuthMode::Enforce,
        )
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}
