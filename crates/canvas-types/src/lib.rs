//! Shared type definitions for the collaborative canvas.
//!
//! This crate is the single source of truth for the shape model exchanged
//! between drawing clients, the realtime server, and the shape store.
//! Wire types flow downstream to `TypeScript` via `ts-rs` so the browser
//! canvas and the server agree on one schema.
//!
//! # Modules
//!
//! - [`shape`] -- The tagged-variant [`Shape`] model and its validation
//! - [`record`] -- [`ShapeRecord`], a shape as persisted in the store
//! - [`ids`] -- Type-safe identifier for realtime connections

pub mod ids;
pub mod record;
pub mod shape;

// Re-export all public types at crate root for convenience.
pub use ids::ConnectionId;
pub use record::ShapeRecord;
pub use shape::{Circle, Line, Rectangle, Shape, ShapeColumns, ShapeError, ShapeKind, validate};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the wire types.

    #[test]
    fn export_bindings() {
        // The files are written to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        let _ = crate::shape::Shape::export_all();
        let _ = crate::shape::ShapeKind::export_all();
        let _ = crate::record::ShapeRecord::export_all();
    }
}
