//! The tagged-variant shape model and its validation predicate.
//!
//! Clients submit shapes as JSON objects discriminated by a `kind` field.
//! Each variant carries only its own geometry, so validation is a
//! structural decode into [`Shape`] rather than field-by-field probing:
//!
//! | `kind` | required fields |
//! |---|---|
//! | `rectangle` | `x`, `y`, `width`, `height`, `color` |
//! | `circle` | `x`, `y`, `radius`, `color` |
//! | `line` | `x`, `y`, `x1`, `y1`, `x2`, `y2`, `color` |
//!
//! Fields that do not belong to the variant are ignored. `color` is an
//! opaque string and is never checked for format.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a candidate payload is not a [`Shape`].
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// The payload is not well-formed JSON.
    #[error("malformed shape payload: {0}")]
    Parse(serde_json::Error),

    /// The payload is JSON but does not match any shape variant.
    #[error("invalid shape: {0}")]
    Invalid(serde_json::Error),

    /// A stored record cannot be turned back into a shape.
    #[error("incomplete shape record {id}: {reason}")]
    Record {
        /// Store-assigned record id.
        id: i64,
        /// What is missing or unknown.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Shape kinds
// ---------------------------------------------------------------------------

/// Discriminant of a [`Shape`], as carried in the `kind` field on the wire
/// and in the `type` column of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Circle.
    Circle,
    /// Straight line segment.
    Line,
}

impl ShapeKind {
    /// The wire and storage tag for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Line => "line",
        }
    }

    /// Look up a kind by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rectangle" => Some(Self::Rectangle),
            "circle" => Some(Self::Circle),
            "line" => Some(Self::Line),
            _ => None,
        }
    }
}

impl core::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Rectangle anchored at (`x`, `y`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Rectangle {
    /// Anchor x coordinate.
    pub x: f64,
    /// Anchor y coordinate.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
    /// Opaque color string.
    pub color: String,
}

/// Circle centered at (`x`, `y`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Circle {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Radius.
    pub radius: f64,
    /// Opaque color string.
    pub color: String,
}

/// Line segment from (`x1`, `y1`) to (`x2`, `y2`).
///
/// Lines also carry the (`x`, `y`) anchor every shape has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Line {
    /// Anchor x coordinate.
    pub x: f64,
    /// Anchor y coordinate.
    pub y: f64,
    /// Start x coordinate.
    pub x1: f64,
    /// Start y coordinate.
    pub y1: f64,
    /// End x coordinate.
    pub x2: f64,
    /// End y coordinate.
    pub y2: f64,
    /// Opaque color string.
    pub color: String,
}

/// A drawing primitive submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Shape {
    /// `{"kind": "rectangle", ...}`
    Rectangle(Rectangle),
    /// `{"kind": "circle", ...}`
    Circle(Circle),
    /// `{"kind": "line", ...}`
    Line(Line),
}

impl Shape {
    /// Decode raw message bytes into a shape.
    ///
    /// Malformed JSON yields [`ShapeError::Parse`]; well-formed JSON that
    /// does not match a variant yields [`ShapeError::Invalid`].
    pub fn parse(payload: &[u8]) -> Result<Self, ShapeError> {
        let value: serde_json::Value =
            serde_json::from_slice(payload).map_err(ShapeError::Parse)?;
        Self::from_value(&value)
    }

    /// Decode an already-parsed JSON value into a shape.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ShapeError> {
        Self::deserialize(value).map_err(ShapeError::Invalid)
    }

    /// The discriminant of this shape.
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle(_) => ShapeKind::Rectangle,
            Self::Circle(_) => ShapeKind::Circle,
            Self::Line(_) => ShapeKind::Line,
        }
    }

    /// The (`x`, `y`) anchor shared by every variant.
    pub const fn origin(&self) -> (f64, f64) {
        match self {
            Self::Rectangle(r) => (r.x, r.y),
            Self::Circle(c) => (c.x, c.y),
            Self::Line(l) => (l.x, l.y),
        }
    }

    /// The shape's color string.
    pub fn color(&self) -> &str {
        match self {
            Self::Rectangle(r) => &r.color,
            Self::Circle(c) => &c.color,
            Self::Line(l) => &l.color,
        }
    }
}

/// Return `true` iff `candidate` is a valid shape.
///
/// Pure predicate: any non-object input, unknown `kind`, or missing or
/// mistyped required field yields `false`.
pub fn validate(candidate: &serde_json::Value) -> bool {
    Shape::from_value(candidate).is_ok()
}

// ---------------------------------------------------------------------------
// Flat column layout
// ---------------------------------------------------------------------------

/// A shape flattened into the store's column layout.
///
/// Columns the variant does not use are `None` and persist as NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeColumns {
    /// Shape discriminant (`type` column).
    pub kind: ShapeKind,
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
}

impl ShapeColumns {
    const fn empty(kind: ShapeKind, x: f64, y: f64, color: String) -> Self {
        Self {
            kind,
            x: Some(x),
            y: Some(y),
            width: None,
            height: None,
            radius: None,
            x1: None,
            y1: None,
            x2: None,
            y2: None,
            color,
        }
    }
}

impl From<&Shape> for ShapeColumns {
    fn from(shape: &Shape) -> Self {
        match shape {
            Shape::Rectangle(r) => Self {
                width: Some(r.width),
                height: Some(r.height),
                ..Self::empty(ShapeKind::Rectangle, r.x, r.y, r.color.clone())
            },
            Shape::Circle(c) => Self {
                radius: Some(c.radius),
                ..Self::empty(ShapeKind::Circle, c.x, c.y, c.color.clone())
            },
            Shape::Line(l) => Self {
                x1: Some(l.x1),
                y1: Some(l.y1),
                x2: Some(l.x2),
                y2: Some(l.y2),
                ..Self::empty(ShapeKind::Line, l.x, l.y, l.color.clone())
            },
        }
    }
}
