//! Canvas server binary.
//!
//! # Startup Sequence
//!
//! 1. Load `.env` if present
//! 2. Initialize structured logging (tracing)
//! 3. Load configuration from the environment
//! 4. Connect to `PostgreSQL` and apply migrations
//! 5. Build the shared [`AppState`]
//! 6. Serve HTTP + `WebSocket` until Ctrl-C / SIGTERM
//! 7. Close the database pool

use std::sync::Arc;

use canvas_db::{PgShapeStore, PostgresConfig, PostgresPool};
use canvas_server::{AppState, CanvasConfig, shutdown_signal, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, database connection, migrations, or
/// binding the listener fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment file (optional).
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // 2. Structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(dotenv_loaded, "canvas-server starting");

    // 3. Configuration.
    let config = CanvasConfig::from_env()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_connections = config.max_connections,
        acquire_timeout_ms = u64::try_from(config.acquire_timeout.as_millis()).unwrap_or(u64::MAX),
        store_timeout_ms = u64::try_from(config.store_timeout.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded"
    );

    // 4. Database.
    let pg_config = PostgresConfig::new(&config.database_url)
        .with_max_connections(config.max_connections)
        .with_acquire_timeout(config.acquire_timeout);
    let pool = PostgresPool::connect(&pg_config).await?;
    if config.run_migrations {
        pool.run_migrations().await?;
    }

    // 5. Shared state.
    let store = PgShapeStore::new(pool).with_operation_timeout(config.store_timeout);
    let state = Arc::new(AppState::new(store));

    // 6. Serve.
    let served = start_server(&config.server, Arc::clone(&state), shutdown_signal()).await;

    // 7. Teardown runs even if serving failed.
    state.shutdown().await;
    served?;

    info!("canvas-server stopped");
    Ok(())
}
