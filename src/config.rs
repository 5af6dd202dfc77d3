use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// MySQL connection string; without it the local JSON store is used
    pub database_url: Option<String>,
    pub local_store_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Leave attachments
    pub attachment_timeout: Duration,
    pub max_attachment_bytes: usize,

    /// Admin account created on startup when missing
    pub bootstrap_admin: Option<(String, String)>,

    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bootstrap_admin = match (
            optional("BOOTSTRAP_ADMIN_USERNAME"),
            optional("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: optional("DATABASE_URL"),
            local_store_path: Some(
                optional("LOCAL_STORE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("data/leave-store.json")),
            ),
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            attachment_timeout: Duration::from_millis(parsed("ATTACHMENT_TIMEOUT_MS", 10_000)?),
            max_attachment_bytes: parsed("MAX_ATTACHMENT_BYTES", 5 * 1024 * 1024)?,

            bootstrap_admin,

            log_level: parsed("LOG_LEVEL", Level::DEBUG)?,
        })
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(local_store_path: Option<PathBuf>) -> Self {
        Self {
            server_addr: "127.0.0.1:0".into(),
            database_url: None,
            local_store_path,
            jwt_secret: "test-secret".into(),
            access_token_ttl: 900,
            rate_login_per_min: 1000,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            attachment_timeout: Duration::from_millis(500),
            max_attachment_bytes: 1024,
            bootstrap_admin: None,
            log_level: Level::DEBUG,
        }
    }
}
