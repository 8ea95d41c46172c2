// # Audit Log Trait
//
// Defines the interface for recording submitted change batches.
//
// ## Purpose
//
// Every batch the provider applies is appended to the audit log together
// with the provider's change id, so operators can trace which run changed
// which zone and when.
//
// ## Implementations
//
// - Memory: `MemoryAuditLog` (tests, one-shot runs)
// - File: `FileAuditLog` (JSON file with crash recovery)

use crate::model::{ChangeBatch, ChangeInfo, ZoneId};
use async_trait::async_trait;

/// One submitted change batch
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditRecord {
    /// Zone the batch was applied to
    pub zone_id: ZoneId,
    /// Zone name as given by the operator
    pub zone_name: String,
    /// Batch comment
    pub comment: String,
    /// Number of CREATE actions
    pub creates: usize,
    /// Number of DELETE actions
    pub deletes: usize,
    /// Provider change id
    pub change_id: String,
    /// Provider change status at submission
    pub status: String,
    /// Local submission time
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    /// The submitted `ChangeResourceRecordSetsRequest` document
    pub request_xml: String,
}

impl AuditRecord {
    /// Build a record for a batch the provider accepted
    ///
    /// # Visibility
    ///
    /// Records are only created by the `Reconciler` after a successful
    /// submission.
    pub(crate) fn new(
        zone_id: &ZoneId,
        zone_name: &str,
        batch: &ChangeBatch,
        info: &ChangeInfo,
        request_xml: String,
    ) -> Self {
        Self {
            zone_id: zone_id.clone(),
            zone_name: zone_name.to_string(),
            comment: batch.comment.clone(),
            creates: batch.creates(),
            deletes: batch.deletes(),
            change_id: info.id.clone(),
            status: info.status.clone(),
            submitted_at: chrono::Utc::now(),
            request_xml,
        }
    }
}

/// Trait for audit log implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Implement locking for thread safety
///
/// ## Forbidden Capabilities
/// - ❌ Spawn background tasks
/// - ❌ Talk to the DNS provider (owned by `ZoneProvider`)
/// - ❌ Decide what gets submitted (owned by the `Reconciler`)
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append a record
    ///
    /// Durable implementations persist before returning.
    async fn append(&self, record: AuditRecord) -> Result<(), crate::Error>;

    /// Records in append order, optionally only those for one zone
    async fn records(&self, zone: Option<&ZoneId>) -> Result<Vec<AuditRecord>, crate::Error>;

    /// Persist any pending records
    async fn flush(&self) -> Result<(), crate::Error>;
}
