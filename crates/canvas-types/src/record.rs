//! A shape as persisted in the store.
//!
//! [`ShapeRecord`] is the authoritative form of a shape once it has been
//! accepted. It mirrors the `shapes` table one-to-one and is what the
//! history endpoint hands to joining clients. Columns irrelevant to the
//! record's kind serialize as `null`. [`ShapeRecord::to_shape`] turns a row
//! back into a typed shape for clients and for store integrity checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::shape::{Circle, Line, Rectangle, Shape, ShapeColumns, ShapeError, ShapeKind};

/// One stored shape row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShapeRecord {
    /// Store-assigned id, increasing with insertion order.
    #[ts(type = "number")]
    pub id: i64,
    /// Shape kind tag (`rectangle`, `circle`, `line`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Anchor x.
    pub x: Option<f64>,
    /// Anchor y.
    pub y: Option<f64>,
    /// Rectangle width.
    pub width: Option<f64>,
    /// Rectangle height.
    pub height: Option<f64>,
    /// Circle radius.
    pub radius: Option<f64>,
    /// Line start x.
    pub x1: Option<f64>,
    /// Line start y.
    pub y1: Option<f64>,
    /// Line end x.
    pub x2: Option<f64>,
    /// Line end y.
    pub y2: Option<f64>,
    /// Color string.
    pub color: String,
    /// When the store accepted the shape.
    pub created_at: DateTime<Utc>,
}

impl ShapeRecord {
    /// Build a record from flattened columns plus store-assigned metadata.
    pub fn from_columns(id: i64, columns: ShapeColumns, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: columns.kind.as_str().to_owned(),
            x: columns.x,
            y: columns.y,
            width: columns.width,
            height: columns.height,
            radius: columns.radius,
            x1: columns.x1,
            y1: columns.y1,
            x2: columns.x2,
            y2: columns.y2,
            color: columns.color,
            created_at,
        }
    }

    /// Rebuild the typed [`Shape`] this record was stored from.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Record`] if the kind tag is unknown or a
    /// column the kind requires is NULL.
    pub fn to_shape(&self) -> Result<Shape, ShapeError> {
        let kind = ShapeKind::from_tag(&self.kind)
            .ok_or_else(|| self.incomplete(format!("unknown kind `{}`", self.kind)))?;
        let x = self.require("x", self.x)?;
        let y = self.require("y", self.y)?;
        let color = self.color.clone();

        let shape = match kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle {
                x,
                y,
                width: self.require("width", self.width)?,
                height: self.require("height", self.height)?,
                color,
            }),
            ShapeKind::Circle => Shape::Circle(Circle {
                x,
                y,
                radius: self.require("radius", self.radius)?,
                color,
            }),
            ShapeKind::Line => Shape::Line(Line {
                x,
                y,
                x1: self.require("x1", self.x1)?,
                y1: self.require("y1", self.y1)?,
                x2: self.require("x2", self.x2)?,
                y2: self.require("y2", self.y2)?,
                color,
            }),
        };
        Ok(shape)
    }

    fn require(&self, column: &str, value: Option<f64>) -> Result<f64, ShapeError> {
        value.ok_or_else(|| self.incomplete(format!("column `{column}` is NULL")))
    }

    const fn incomplete(&self, reason: String) -> ShapeError {
        ShapeError::Record {
            id: self.id,
            reason,
        }
    }
}
