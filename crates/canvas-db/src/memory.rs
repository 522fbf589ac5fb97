//! In-process shape store.
//!
//! [`MemoryShapeStore`] keeps records in a vector behind an async lock and
//! assigns ids in insertion order, matching the `PostgreSQL` backend's
//! observable behavior. It can be switched offline with
//! [`MemoryShapeStore::set_available`] so store outages can be exercised
//! without a database.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use canvas_types::{Shape, ShapeColumns, ShapeRecord};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::DbError;

/// Volatile shape store. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryShapeStore {
    records: Arc<RwLock<Vec<ShapeRecord>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryShapeStore {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the store reachable (`true`) or fail every operation (`false`).
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(String::from("memory store is offline")));
        }
        Ok(())
    }

    pub(crate) async fn store(&self, shape: &Shape) -> Result<ShapeRecord, DbError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        let id = i64::try_from(records.len())
            .map_err(|e| DbError::Unavailable(format!("record id overflow: {e}")))?
            .saturating_add(1);
        let record = ShapeRecord::from_columns(id, ShapeColumns::from(shape), Utc::now());
        records.push(record.clone());
        Ok(record)
    }

    pub(crate) async fn fetch_all(&self) -> Result<Vec<ShapeRecord>, DbError> {
        self.check_available()?;
        Ok(self.records.read().await.clone())
    }
}
