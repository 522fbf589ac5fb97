//! Realtime broadcast server for the collaborative canvas.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/`, `/ws`) where clients submit shapes and
//!   receive every shape drawn by other clients
//! - **REST endpoint** (`/shapes`) returning the full shape history so a
//!   joining client can rebuild the canvas
//!
//! # Architecture
//!
//! ```text
//! client --> session (parse/validate) --> ShapeStore (durable write)
//!                                            |
//!                  ConnectionRegistry <------+
//!                          |
//!                          +--> every other open connection
//! ```
//!
//! The store handle and the connection registry live in one [`AppState`]
//! built at startup and shared with every handler.

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

// Re-export primary types for convenience.
pub use config::{CanvasConfig, ConfigError};
pub use registry::{ConnectionRegistry, ConnectionState, DeliveryError};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, shutdown_signal, start_server};
pub use session::FrameOutcome;
pub use state::AppState;
