use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::Record;

/// In-process append-only table.
///
/// Wrapped in `Arc` so clones share the same rows, like a connection pool
/// shares one database. Ids start at 1 and increase by one per insert.
pub struct MemoryTable<T> {
    inner: Arc<RwLock<Rows<T>>>,
}

struct Rows<T> {
    last_id: i64,
    rows: Vec<T>,
}

impl<T> Default for MemoryTable<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Rows {
                last_id: 0,
                rows: Vec::new(),
            })),
        }
    }
}

impl<T> Clone for MemoryTable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Record> MemoryTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, timestamp: DateTime<Utc>, measurements: T::Measurements) -> T {
        let mut guard = self.inner.write().await;
        guard.last_id += 1;
        let record = T::assemble(guard.last_id, timestamp, measurements);
        guard.rows.push(record.clone());
        record
    }

    /// Snapshot of every row in insertion order.
    pub async fn all(&self) -> Vec<T> {
        self.inner.read().await.rows.clone()
    }

    /// Rows whose timestamp satisfies `pred`, in insertion order.
    pub async fn matching(&self, pred: impl Fn(DateTime<Utc>) -> bool) -> Vec<T> {
        self.inner
            .read()
            .await
            .rows
            .iter()
            .filter(|r| pred(r.timestamp()))
            .cloned()
            .collect()
    }
}
