//! Axum router construction for the canvas server.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for browser clients served elsewhere.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::session;
use crate::state::AppState;

/// Build the complete Axum router for the canvas server.
///
/// The router includes:
/// - `GET /` -- `WebSocket` drawing session
/// - `GET /ws` -- `WebSocket` drawing session
/// - `GET /shapes` -- shape history
/// - `GET /health` -- liveness
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(session::ws_canvas))
        .route("/ws", get(session::ws_canvas))
        .route("/shapes", get(handlers::list_shapes))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
