//! Shared application state for the canvas server.
//!
//! [`AppState`] is built once at startup and handed to every handler via
//! Axum's `State` extractor. It owns the shape store handle and the
//! registry of open realtime connections.

use canvas_db::ShapeStore;

use crate::registry::ConnectionRegistry;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway for shapes.
    pub store: ShapeStore,
    /// Currently open realtime connections.
    pub registry: ConnectionRegistry,
}

impl AppState {
    /// Create application state around a shape store with no connections.
    pub fn new(store: impl Into<ShapeStore>) -> Self {
        Self {
            store: store.into(),
            registry: ConnectionRegistry::new(),
        }
    }

    /// Release resources held by the state (closes the store's pool).
    pub async fn shutdown(&self) {
        let open = self.registry.len().await;
        tracing::info!(open_connections = open, backend = self.store.name(), "Shutting down canvas state");
        self.store.close().await;
    }
}
