// # Memory Audit Log
//
// In-memory implementation of AuditLog.
//
// All records are lost when the process exits. Used by tests and by runs
// that only want the audit trail for the lifetime of one `Reconciler`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::ZoneId;
use crate::traits::audit_log::{AuditLog, AuditRecord};

/// In-memory audit log
///
/// Clones share the same underlying records.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    inner: Arc<RwLock<Vec<AuditRecord>>>,
}

impl MemoryAuditLog {
    /// Create an empty audit log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no record has been appended
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<(), Error> {
        self.inner.write().await.push(record);
        Ok(())
    }

    async fn records(&self, zone: Option<&ZoneId>) -> Result<Vec<AuditRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .iter()
            .filter(|r| zone.is_none_or(|z| &r.zone_id == z))
            .cloned()
            .collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
