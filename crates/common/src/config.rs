//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Per-service listen ports.
    #[serde(default)]
    pub services: ServicesConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token and cookie configuration.
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration shared by all services.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Directory holding a prebuilt single-page application, if any.
    #[serde(default)]
    pub static_dir: Option<String>,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Enable only behind a reverse proxy that sets those headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            cors_origins: default_cors_origins(),
            static_dir: None,
            trust_proxy_headers: false,
        }
    }
}

/// Listen ports of the individual services.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_auth_port")]
    pub auth_port: u16,
    #[serde(default = "default_tweets_port")]
    pub tweets_port: u16,
    #[serde(default = "default_messages_port")]
    pub messages_port: u16,
    #[serde(default = "default_notifications_port")]
    pub notifications_port: u16,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            auth_port: default_auth_port(),
            tweets_port: default_tweets_port(),
            messages_port: default_messages_port(),
            notifications_port: default_notifications_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens.
    pub jwt_secret: String,
    /// Token lifetime in days.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    /// Mark the `jwt` cookie as `Secure`.
    #[serde(default = "default_true")]
    pub secure_cookie: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5000".to_string(),
        "http://localhost".to_string(),
    ]
}

const fn default_auth_port() -> u16 {
    5000
}

const fn default_tweets_port() -> u16 {
    5001
}

const fn default_messages_port() -> u16 {
    5002
}

const fn default_notifications_port() -> u16 {
    5003
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_token_ttl_days() -> i64 {
    30
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `FLOCK_ENV`)
    /// 4. Environment variables with `FLOCK__` prefix
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let env = std::env::var("FLOCK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(environment_source())
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment_source())
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the services cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::Config("auth.jwt_secret must be set".to_string()));
        }
        if self.auth.token_ttl_days <= 0 {
            return Err(AppError::Config(
                "auth.token_ttl_days must be positive".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Config(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        Ok(())
    }
}

fn environment_source() -> config::Environment {
    config::Environment::with_prefix("FLOCK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("server.cors_origins")
}
