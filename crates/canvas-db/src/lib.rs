//! Data layer for the collaborative canvas.
//!
//! Every accepted shape is appended to the `shapes` table in `PostgreSQL`
//! before it is shown to any other client, and the full table is replayed
//! to clients that join later.
//!
//! # Architecture
//!
//! ```text
//! Session handler --store()-----> ShapeStore --INSERT--> shapes
//! History endpoint --fetch_all()-> ShapeStore --SELECT--> shapes
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`shape_store`] -- The [`ShapeStore`] gateway and its `PostgreSQL` backend
//! - [`memory`] -- In-process backend for tests and local runs
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod postgres;
pub mod shape_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryShapeStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use shape_store::{PgShapeStore, ShapeRow, ShapeStore};
