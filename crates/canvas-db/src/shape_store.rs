//! The shape persistence gateway.
//!
//! [`ShapeStore`] is the only way the server touches stored shapes. It
//! offers exactly two operations: append one shape ([`ShapeStore::store`])
//! and replay all of them in insertion order ([`ShapeStore::fetch_all`]).
//! Nothing is ever updated or deleted.
//!
//! Backends are dispatched through an enum rather than a trait object
//! because async methods are not dyn-compatible.

use std::time::Duration;

use canvas_types::{Shape, ShapeColumns, ShapeRecord};

use crate::error::DbError;
use crate::memory::MemoryShapeStore;
use crate::postgres::PostgresPool;

/// Default bound on a single store operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Gateway (enum dispatch)
// ---------------------------------------------------------------------------

/// Handle to the shape store.
///
/// Cheap to clone; every clone talks to the same backing store.
#[derive(Clone)]
pub enum ShapeStore {
    /// Durable `PostgreSQL` backend.
    Postgres(PgShapeStore),
    /// In-process backend.
    Memory(MemoryShapeStore),
}

impl ShapeStore {
    /// Append a validated shape and return the stored record.
    ///
    /// The insert is a single statement: either the whole row is written
    /// or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on connectivity loss, constraint violation, or
    /// timeout. The shape must then be treated as not stored.
    pub async fn store(&self, shape: &Shape) -> Result<ShapeRecord, DbError> {
        match self {
            Self::Postgres(backend) => backend.store(shape).await,
            Self::Memory(backend) => backend.store(shape).await,
        }
    }

    /// Return every stored shape in insertion order.
    ///
    /// An empty store yields an empty vector. Rows that no longer describe
    /// a complete shape are still returned and logged at `warn`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    pub async fn fetch_all(&self) -> Result<Vec<ShapeRecord>, DbError> {
        let records = match self {
            Self::Postgres(backend) => backend.fetch_all().await?,
            Self::Memory(backend) => backend.fetch_all().await?,
        };
        report_incomplete(&records);
        Ok(records)
    }

    /// Release backend resources.
    pub async fn close(&self) {
        match self {
            Self::Postgres(backend) => backend.pool.close().await,
            Self::Memory(_) => {}
        }
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<PgShapeStore> for ShapeStore {
    fn from(backend: PgShapeStore) -> Self {
        Self::Postgres(backend)
    }
}

impl From<MemoryShapeStore> for ShapeStore {
    fn from(backend: MemoryShapeStore) -> Self {
        Self::Memory(backend)
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL backend
// ---------------------------------------------------------------------------

/// Operations on the `shapes` table.
#[derive(Clone)]
pub struct PgShapeStore {
    pool: PostgresPool,
    operation_timeout: Duration,
}

impl PgShapeStore {
    /// Create a shape store bound to a connection pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self {
            pool,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Set the bound on each store operation.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Insert one shape row.
    async fn store(&self, shape: &Shape) -> Result<ShapeRecord, DbError> {
        let columns = ShapeColumns::from(shape);

        let insert = sqlx::query_as::<_, ShapeRow>(
            r"INSERT INTO shapes (type, x, y, width, height, radius, x1, y1, x2, y2, color)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
              RETURNING id, type AS kind, x, y, width, height, radius, x1, y1, x2, y2, color, created_at",
        )
        .bind(columns.kind.as_str())
        .bind(columns.x)
        .bind(columns.y)
        .bind(columns.width)
        .bind(columns.height)
        .bind(columns.radius)
        .bind(columns.x1)
        .bind(columns.y1)
        .bind(columns.x2)
        .bind(columns.y2)
        .bind(&columns.color)
        .fetch_one(self.pool.pool());

        let row = tokio::time::timeout(self.operation_timeout, insert)
            .await
            .map_err(|_elapsed| DbError::Timeout {
                operation: "store shape",
                timeout: self.operation_timeout,
            })??;

        tracing::debug!(id = row.id, kind = %columns.kind, "Inserted shape");
        Ok(row.into())
    }

    /// Select every shape row in insertion order.
    async fn fetch_all(&self) -> Result<Vec<ShapeRecord>, DbError> {
        let select = sqlx::query_as::<_, ShapeRow>(
            r"SELECT id, type AS kind, x, y, width, height, radius, x1, y1, x2, y2, color, created_at
              FROM shapes
              ORDER BY id",
        )
        .fetch_all(self.pool.pool());

        let rows = tokio::time::timeout(self.operation_timeout, select)
            .await
            .map_err(|_elapsed| DbError::Timeout {
                operation: "fetch shapes",
                timeout: self.operation_timeout,
            })??;

        tracing::debug!(count = rows.len(), "Fetched shapes");
        Ok(rows.into_iter().map(ShapeRecord::from).collect())
    }
}

/// Log every record that cannot be rebuilt into a [`Shape`].
///
/// Returns how many were found.
fn report_incomplete(records: &[ShapeRecord]) -> usize {
    records
        .iter()
        .filter_map(|record| record.to_shape().err())
        .inspect(|e| tracing::warn!(error = %e, "Stored shape is incomplete"))
        .count()
}

/// A row from the `shapes` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShapeRow {
    /// Auto-incremented shape ID.
    pub id: i64,
    /// The `type` column.
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
    /// Insertion timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ShapeRow> for ShapeRecord {
    fn from(row: ShapeRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            x: row.x,
            y: row.y,
            width: row.width,
            height: row.height,
            radius: row.radius,
            x1: row.x1,
            y1: row.y1,
            x2: row.x2,
            y2: row.y2,
            color: row.color,
            created_at: row.created_at,
        }
    }
}
