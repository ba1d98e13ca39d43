use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::auth::{DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where repositories keep their data
#[derive(Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres(String),
    /// `DATABASE_URL=memory`; data is lost on restart
    InMemory,
}

impl fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres(_) => f.write_str("Postgres(<redacted>)"),
            StorageBackend::InMemory => f.write_str("InMemory"),
        }
    }
}

/// Process configuration, read once at startup
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub storage: StorageBackend,
    pub token_ttl_hours: i64,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("storage", &self.storage)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout", &self.db_acquire_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_port = required(&lookup, "PORT")?;
        // Accept ":5050" as well as "5050"
        let port = raw_port
            .trim_start_matches(':')
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw_port.clone(),
            })?;

        let jwt_secret = required(&lookup, "JWT_SECRET")?;
        let database_url = required(&lookup, "DATABASE_URL")?;
        let storage = if database_url == "memory" {
            StorageBackend::InMemory
        } else {
            StorageBackend::Postgres(database_url)
        };

        let token_ttl_hours = parsed(&lookup, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            jwt_secret,
            storage,
            token_ttl_hours,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: Duration::from_secs(parsed(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                5,
            )?),
            request_timeout: Duration::from_secs(parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
