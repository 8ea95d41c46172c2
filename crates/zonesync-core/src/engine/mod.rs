//! Reconciliation pipeline
//!
//! The Reconciler is responsible for:
//! - Resolving a zone name to the provider's identifier
//! - Fetching the complete remote record set page by page
//! - Normalizing and diffing remote against desired state
//! - Validating the resulting change batch
//! - Submitting it and appending the result to the audit log
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  list zones / pages / change  ┌──────────────┐
//! │ ZoneProvider │◄──────────────────────────────│  Reconciler  │
//! └──────────────┘                               └──────────────┘
//!                                                        │
//!                         ┌──────────────────────────────┼─────────────┐
//!                         ▼                              ▼             ▼
//!                 ┌──────────────┐              ┌──────────────┐ ┌──────────┐
//!                 │ normalize +  │              │   AuditLog   │ │  Events  │
//!                 │ diff + check │              │  (append)    │ │ (notify) │
//!                 └──────────────┘              └──────────────┘ └──────────┘
//! ```
//!
//! ## Flow
//!
//! 1. `resolve_zone` → [`ZoneId`]
//! 2. `fetch_remote` → merged [`RecordSet`] (all pages or an error)
//! 3. `plan` → `None` when nothing differs, else a [`ChangePlan`]
//! 4. `submit` → [`ChangeInfo`], audit record appended

use crate::config::{ChangeBatchLimits, SyncConfig};
use crate::diff::{document_to_record_set, generate_change_batch};
use crate::error::{Error, Result};
use crate::fetch::{fetch_record_set_pages_with, merge_pages};
use crate::model::{
    ChangeBatch, ChangeInfo, RecordSet, ZoneId, ensure_namespace, ensure_record_sets,
};
use crate::normalize::normalize;
use crate::resolve;
use crate::traits::{AuditLog, AuditRecord, ZoneProvider};
use crate::validate::{Violation, validate_change_batch};
use crate::xml::Element;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Zone name resolved to an identifier
    ZoneResolved { zone_name: String, zone_id: ZoneId },

    /// One record-set page fetched
    PageFetched {
        page: usize,
        entries: usize,
        truncated: bool,
    },

    /// All pages fetched
    FetchCompleted { pages: usize, entries: usize },

    /// Remote already matches the desired state
    NoChanges,

    /// A change batch was computed
    ChangesPlanned { creates: usize, deletes: usize },

    /// The planned batch exceeds provider limits
    ValidationFailed { violations: Vec<Violation> },

    /// The provider accepted a batch
    ChangesSubmitted {
        zone_id: ZoneId,
        change_id: String,
        status: String,
    },

    /// The provider rejected a batch or could not be reached
    SubmissionFailed { zone_id: ZoneId, error: String },
}

/// A computed change batch with its validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePlan {
    /// Changes turning the remote state into the desired state
    pub batch: ChangeBatch,
    /// Provider limits the batch exceeds; empty when submittable
    pub violations: Vec<Violation>,
}

impl ChangePlan {
    /// Whether the batch may be submitted
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Drives one zone through resolve, fetch, plan and submit
///
/// Each step is a separate call so callers can show the plan and ask for
/// confirmation before submitting. Nothing is retried: any error aborts the
/// current step and is returned unchanged.
pub struct Reconciler {
    /// Transport to the DNS provider
    provider: Box<dyn ZoneProvider>,

    /// Optional audit trail of submitted batches
    audit_log: Option<Box<dyn AuditLog>>,

    /// Provider batch limits
    limits: ChangeBatchLimits,

    /// API version for serialized documents
    api_version: String,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl Reconciler {
    /// Create a new Reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// progress events
    pub fn new(
        provider: Box<dyn ZoneProvider>,
        audit_log: Option<Box<dyn AuditLog>>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            provider,
            audit_log,
            limits: config.limits,
            api_version: config.api_version.clone(),
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// API version used for serialized documents
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolve a zone name to its identifier
    pub async fn resolve_zone(&self, zone_name: &str) -> Result<ZoneId> {
        let zone_id = resolve::resolve_zone(self.provider.as_ref(), zone_name).await?;
        info!("Zone {} is {}", zone_name, zone_id);
        self.emit_event(SyncEvent::ZoneResolved {
            zone_name: zone_name.to_string(),
            zone_id: zone_id.clone(),
        });
        Ok(zone_id)
    }

    /// Fetch and merge every record-set page of a zone
    ///
    /// The result is not normalized.
    pub async fn fetch_remote(&self, zone_id: &ZoneId) -> Result<RecordSet> {
        let pages = fetch_record_set_pages_with(self.provider.as_ref(), zone_id, |page, p| {
            self.emit_event(SyncEvent::PageFetched {
                page,
                entries: p.entries.len(),
                truncated: p.is_truncated,
            });
        })
        .await?;

        let page_count = pages.len();
        let remote = merge_pages(pages);
        info!(
            "Fetched {} record sets for {} in {} pages",
            remote.len(),
            zone_id,
            page_count
        );
        self.emit_event(SyncEvent::FetchCompleted {
            pages: page_count,
            entries: remote.len(),
        });
        Ok(remote)
    }

    /// Normalize both sides, diff them and validate the result
    ///
    /// Returns `None` when the desired state already matches the remote.
    pub fn plan(
        &self,
        mut remote: RecordSet,
        mut desired: RecordSet,
        comment: Option<String>,
    ) -> Result<Option<ChangePlan>> {
        normalize(&mut remote);
        normalize(&mut desired);

        let Some(batch) = generate_change_batch(&remote, &desired, comment)? else {
            info!("No changes found");
            self.emit_event(SyncEvent::NoChanges);
            return Ok(None);
        };

        info!(
            "Planned {} changes ({} deletes, {} creates)",
            batch.len(),
            batch.deletes(),
            batch.creates()
        );
        self.emit_event(SyncEvent::ChangesPlanned {
            creates: batch.creates(),
            deletes: batch.deletes(),
        });

        let violations = validate_change_batch(&batch, &self.limits);
        if !violations.is_empty() {
            for violation in &violations {
                warn!("Changeset invalid: {}", violation);
            }
            self.emit_event(SyncEvent::ValidationFailed {
                violations: violations.clone(),
            });
        }

        Ok(Some(ChangePlan { batch, violations }))
    }

    /// [`Reconciler::plan`] over raw `<ResourceRecordSets>` element trees
    ///
    /// Any other root, or a root without the namespace of the configured API
    /// version, fails with [`Error::InvalidArgument`].
    pub fn plan_documents(
        &self,
        remote: &Element,
        desired: &Element,
        comment: Option<String>,
    ) -> Result<Option<ChangePlan>> {
        ensure_record_sets(remote)?;
        ensure_record_sets(desired)?;
        ensure_namespace(remote, &self.api_version)?;
        ensure_namespace(desired, &self.api_version)?;
        self.plan(
            document_to_record_set(remote)?,
            document_to_record_set(desired)?,
            comment,
        )
    }

    /// Submit a plan to the provider
    ///
    /// Plans with violations are refused with [`Error::ChangesetInvalid`]
    /// before anything is sent. After the provider accepts the batch an
    /// audit record is appended; a failing append is returned as an error
    /// even though the change was applied. Dry-run providers are not audited.
    pub async fn submit(
        &self,
        zone_id: &ZoneId,
        zone_name: &str,
        plan: &ChangePlan,
    ) -> Result<ChangeInfo> {
        if !plan.is_valid() {
            return Err(Error::ChangesetInvalid(plan.violations.clone()));
        }

        let request_xml = plan.batch.to_xml(&self.api_version, false)?;
        debug!("Submitting {} changes to {}", plan.batch.len(), zone_id);

        let response = match self
            .provider
            .change_record_sets(zone_id, &request_xml)
            .await
            .and_then(|body| ChangeInfo::from_xml(&body))
        {
            Ok(info) => info,
            Err(e) => {
                error!(
                    "Submitting changes to {} via {} failed: {}",
                    zone_id,
                    self.provider.provider_name(),
                    e
                );
                self.emit_event(SyncEvent::SubmissionFailed {
                    zone_id: zone_id.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(
            "Change {} for {} is {}",
            response.short_id(),
            zone_id,
            response.status
        );
        self.emit_event(SyncEvent::ChangesSubmitted {
            zone_id: zone_id.clone(),
            change_id: response.id.clone(),
            status: response.status.clone(),
        });

        if self.provider.is_dry_run() {
            info!("Dry run: change {} not recorded in the audit log", response.short_id());
            return Ok(response);
        }

        if let Some(audit_log) = &self.audit_log {
            let record = AuditRecord::new(zone_id, zone_name, &plan.batch, &response, request_xml);
            audit_log.append(record).await.map_err(|e| {
                error!("Change {} applied but not audited: {}", response.id, e);
                e
            })?;
        }

        Ok(response)
    }

    /// Flush the audit log, if any
    pub async fn flush(&self) -> Result<()> {
        match &self.audit_log {
            Some(audit_log) => audit_log.flush().await,
            None => Ok(()),
        }
    }

    /// Emit a progress event
    ///
    /// A full channel drops the event with a warning; a closed channel
    /// (nobody listening) drops it silently.
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
        }
    }
}
