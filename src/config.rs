use std::{fmt, net::SocketAddr, time::Duration};

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Signing secret used when `JWT_SECRET` is unset outside production.
pub const DEV_JWT_SECRET: &str = "gogog-development-secret-do-not-deploy";

/// Session tokens are valid for 24 hours.
pub const TOKEN_TTL_MINUTES: i64 = 24 * 60;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub connect: PgConnectOptions,
    pub max_connections: u32,
    pub max_lifetime: Duration,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.connect.get_host())
            .field("port", &self.connect.get_port())
            .field("database", &self.connect.get_database())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    /// `DATABASE_URL` wins; otherwise the `DB_*` parts are set field by field
    /// so credentials never pass through URL parsing.
    fn from_lookup<F>(var: &F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connect = match var("DATABASE_URL") {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .context("invalid DATABASE_URL")?,
            None => {
                let port = var("DB_PORT").unwrap_or_else(|| "5432".into());
                let port = port
                    .parse::<u16>()
                    .with_context(|| format!("invalid DB_PORT {port:?}"))?;
                let ssl_mode = var("DB_SSLMODE").unwrap_or_else(|| "disable".into());
                let ssl_mode = ssl_mode
                    .parse::<PgSslMode>()
                    .with_context(|| format!("invalid DB_SSLMODE {ssl_mode:?}"))?;
                PgConnectOptions::new()
                    .host(&var("DB_HOST").unwrap_or_else(|| "localhost".into()))
                    .port(port)
                    .username(&var("DB_USER").unwrap_or_else(|| "postgres".into()))
                    .password(&var("DB_PASSWORD").unwrap_or_else(|| "postgres".into()))
                    .database(&var("DB_NAME").unwrap_or_else(|| "gogog".into()))
                    .ssl_mode(ssl_mode)
            }
        };
        let max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(25);
        Ok(Self {
            connect,
            max_connections,
            max_lifetime: Duration::from_secs(5 * 60),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// `None` runs the no-database development mode.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("APP_ENV")
            .or_else(|| var("ENV"))
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let skip_db = var("SKIP_DB")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if skip_db && environment.is_production() {
            anyhow::bail!("SKIP_DB=true is not allowed in production");
        }

        let secret = match var("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) if environment.is_production() && secret == DEV_JWT_SECRET => {
                anyhow::bail!("JWT_SECRET must not be the development default in production")
            }
            Some(secret) => secret,
            None if environment.is_production() => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            None => {
                tracing::warn!("JWT_SECRET not set; falling back to the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "gogog".into()),
            ttl_minutes: TOKEN_TTL_MINUTES,
        };

        let database = if skip_db {
            None
        } else {
            Some(DatabaseConfig::from_lookup(&var)?)
        };

        let port = var("APP_PORT")
            .or_else(|| var("PORT"))
            .unwrap_or_else(|| "8080".into());
        let port = port
            .parse::<u16>()
            .with_context(|| format!("invalid port {port:?}"))?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        // Credentialed CORS needs explicit origins.
        if cors_origins.iter().any(|o| o == "*") {
            anyhow::bail!("CORS_ORIGINS must list explicit origins; `*` is not allowed with credentials");
        }

        Ok(Self {
            environment,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database,
            jwt,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("parse bind address")
    }

    pub fn skip_db(&self) -> bool {
        self.database.is_none()
    }
}
