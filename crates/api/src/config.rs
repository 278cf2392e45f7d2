//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use medistock_infra::PostgresConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

/// Where inventory state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process-local store (dev/test). State is lost on restart.
    InMemory,
    Postgres(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub storage: StorageConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_var(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.to_string())?;

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let use_persistent: bool =
            parse_var(&lookup, "USE_PERSISTENT_STORES", "false".to_string())?;

        let storage = if use_persistent {
            let database_url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;

            let mut pg = PostgresConfig::new(database_url);
            pg.max_connections = parse_var(
                &lookup,
                "DB_MAX_CONNECTIONS",
                PostgresConfig::DEFAULT_MAX_CONNECTIONS.to_string(),
            )?;
            pg.acquire_timeout = Duration::from_secs(parse_var(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                PostgresConfig::DEFAULT_ACQUIRE_TIMEOUT.as_secs().to_string(),
            )?);
            pg.statement_timeout = Duration::from_millis(parse_var(
                &lookup,
                "DB_STATEMENT_TIMEOUT_MS",
                PostgresConfig::DEFAULT_STATEMENT_TIMEOUT.as_millis().to_string(),
            )?);
            StorageConfig::Postgres(pg)
        } else {
            StorageConfig::InMemory
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            storage,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: String,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(name).unwrap_or(default);
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
