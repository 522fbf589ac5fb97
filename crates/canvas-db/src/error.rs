//! Error types for the data layer.
//!
//! All store failures surface as [`DbError`]. Callers treat any variant
//! as "no proof of durability": a shape whose write returned an error must
//! not be shown to other clients.

use std::time::Duration;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A store operation did not complete in time.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The operation that was abandoned.
        operation: &'static str,
        /// The configured bound.
        timeout: Duration,
    },

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
