//! # In-Memory Catalog Backend
//!
//! A CRUD backend held in process memory. Used by tests and by the CLI's
//! `--catalog-file` option. Records are kept as raw JSON, so malformed
//! records can be seeded to exercise the catalog's per-record validation, and
//! failures can be injected to exercise the retry path.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use storefront_core::{NewProduct, ProductId, ProductPatch};

use crate::backend::CatalogBackend;
use crate::error::{SyncError, SyncResult};

/// Product store living in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogBackend {
    records: Mutex<Vec<Value>>,
    pending_failures: AtomicU32,
    calls: AtomicUsize,
}

impl MemoryCatalogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend with raw records (kept as-is, valid or not).
    pub fn with_records(records: Vec<Value>) -> Self {
        MemoryCatalogBackend {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Replaces every record.
    pub fn set_records(&self, records: Vec<Value>) {
        *self.records() = records;
    }

    /// Makes the next `count` calls fail with a 503.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of calls received (failed ones included).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn records(&self) -> MutexGuard<'_, Vec<Value>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts the call and consumes one injected failure if any is pending.
    fn begin_call(&self, operation: &str) -> SyncResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if injected {
            debug!(operation, "Injected backend failure");
            return Err(SyncError::Remote {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn position(records: &[Value], id: &ProductId) -> Option<usize> {
        records
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalogBackend {
    async fn list(&self) -> SyncResult<Vec<Value>> {
        self.begin_call("list")?;
        Ok(self.records().clone())
    }

    async fn get(&self, id: &ProductId) -> SyncResult<Value> {
        self.begin_call("get")?;
        let records = self.records();
        Self::position(&records, id)
            .map(|i| records[i].clone())
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    async fn create(&self, product: &NewProduct) -> SyncResult<Value> {
        self.begin_call("create")?;

        let mut record = serde_json::to_value(product)?;
        if let Value::Object(fields) = &mut record {
            fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        self.records().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &ProductId, patch: &ProductPatch) -> SyncResult<Value> {
        self.begin_call("update")?;

        let changes = serde_json::to_value(patch)?;
        let mut records = self.records();
        let index =
            Self::position(&records, id).ok_or_else(|| SyncError::NotFound(id.to_string()))?;

        if let (Value::Object(stored), Value::Object(changes)) = (&mut records[index], changes) {
            stored.extend(changes);
        }
        Ok(records[index].clone())
    }

    async fn delete(&self, id: &ProductId) -> SyncResult<()> {
        self.begin_call("delete")?;

        let mut records = self.records();
        let index =
            Self::position(&records, id).ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        records.remove(index);
        Ok(())
    }
}
