//! Configuration for the canvas server.
//!
//! All configuration is loaded from environment variables (after an
//! optional `.env` file has been read by the binary). Only the database URL
//! is required.

use std::time::Duration;

use canvas_db::postgres::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use canvas_db::shape_store::DEFAULT_OPERATION_TIMEOUT;

use crate::server::ServerConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3001;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required env var {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        reason: String,
    },
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Pool size.
    pub max_connections: u32,
    /// Bound on waiting for a pooled connection.
    pub acquire_timeout: Duration,
    /// Bound on each store operation.
    pub store_timeout: Duration,
    /// Whether to apply embedded migrations at startup.
    pub run_migrations: bool,
}

impl CanvasConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `DATABASE_URL` -- `PostgreSQL` connection string
    ///
    /// Optional variables:
    /// - `HOST` -- bind address (default `0.0.0.0`)
    /// - `PORT` -- listen port (default 3001)
    /// - `DATABASE_MAX_CONNECTIONS` -- pool size (default 10)
    /// - `DATABASE_ACQUIRE_TIMEOUT_MS` -- wait for a pooled connection (default 5000)
    /// - `STORE_TIMEOUT_MS` -- per-operation store timeout (default 5000)
    /// - `RUN_MIGRATIONS` -- apply migrations at startup (default `true`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let host = lookup("HOST").unwrap_or_else(|| String::from("0.0.0.0"));
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let acquire_timeout =
            millis_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_MS", DEFAULT_ACQUIRE_TIMEOUT)?;
        let store_timeout = millis_or(&lookup, "STORE_TIMEOUT_MS", DEFAULT_OPERATION_TIMEOUT)?;
        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        Ok(Self {
            server: ServerConfig { host, port },
            database_url,
            max_connections,
            acquire_timeout,
            store_timeout,
            run_migrations,
        })
    }
}

/// Parse an optional millisecond count into a [`Duration`].
fn millis_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_or(lookup, name, default_ms).map(Duration::from_millis)
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config =
            CanvasConfig::from_lookup(lookup(&[("DATABASE_URL", "postgresql://localhost/canvas")]))
                .unwrap();
        assert_eq!(config.database_url, "postgresql://localhost/canvas");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert!(config.run_migrations);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = CanvasConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://db/canvas"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_ACQUIRE_TIMEOUT_MS", "750"),
            ("STORE_TIMEOUT_MS", "250"),
            ("RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_millis(750));
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = CanvasConfig::from_lookup(lookup(&[("PORT", "3001")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        let err = CanvasConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = CanvasConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/canvas"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
