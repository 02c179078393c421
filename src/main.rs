mod app;
mod auth;
mod config;
mod content;
mod error;
mod extract;
mod gamification;
mod progress;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "gogog=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        skip_db = config.skip_db(),
        "configuration loaded"
    );

    let state = AppState::init(config).await?;
    tracing::info!(auth_mode = ?state.gate.mode(), "authorization configured");

    if let Some(db) = &state.db {
        sqlx::migrate!("./migrations").run(db).await?;
        tracing::info!("migrations applied");
    }

    let db = state.db.clone();
    let config = state.config.clone();
    let app = app::build_app(state);
    app::serve(app, &config).await?;

    if let Some(db) = db {
        db.close().await;
    }
    tracing::info!("server stopped");

    Ok(())
}
