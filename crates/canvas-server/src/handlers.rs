//! REST endpoint handlers for the canvas server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/shapes` | Full shape history in insertion order |
//! | `GET` | `/health` | Liveness and open connection count |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use canvas_types::ShapeRecord;

use crate::error::ApiError;
use crate::state::AppState;

/// Return every stored shape so a joining client can rebuild the canvas.
///
/// Records carry every column, with `null` for columns the shape kind
/// does not use.
pub async fn list_shapes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShapeRecord>>, ApiError> {
    let shapes = state.store.fetch_all().await.map_err(ApiError::FetchShapes)?;
    tracing::debug!(count = shapes.len(), "Serving shape history");
    Ok(Json(shapes))
}

/// Report liveness and the number of open realtime connections.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let connections = state.registry.len().await;
    Json(serde_json::json!({
        "status": "ok",
        "connections": connections,
    }))
}
