//! Environment configuration

use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://reservations.db";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:6655";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{0}` must be set")]
    Missing(&'static str),

    #[error("`{var}` has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub listen_addr: String,
    /// Telegram bot token, the signed-login HMAC key is derived from it.
    pub bot_token: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Maximum age of `auth_date` in a signed login payload.
    pub login_max_age_secs: i64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honored.
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        let bot_token = required("TOKEN_BOT")?;
        let jwt_secret = optional("JWT_SECRET").unwrap_or_else(|| bot_token.clone());

        Ok(AppConfig {
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            listen_addr: optional("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned()),
            bot_token,
            jwt_secret,
            token_ttl_hours: parsed("JWT_TTL_HOURS", 24)?,
            login_max_age_secs: parsed("LOGIN_MAX_AGE_SECS", 86_400)?,
            cors_origins: optional("CORS_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_owned())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
        })
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

fn parsed<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
