// # zonesync-core
//
// Core library for reconciling a declared DNS zone against a hosted zone.
//
// ## Architecture Overview
//
// - **Model**: record sets, change batches and the provider's documents
// - **XML codec**: element tree parser and deterministic writer
// - **Fetcher**: reassembles a record set the provider returns in pages
// - **Normalizer**: canonical form so equal data compares equal
// - **Differ**: minimal delete/create batch between two record sets
// - **Validator**: provider limits on one change batch
// - **Zone resolver**: zone name to provider identifier
// - **Reconciler**: orchestrates the pipeline and emits progress events
// - **ZoneProvider**: trait for the transport to the provider API
// - **AuditLog**: trait for recording submitted batches
// - **ProviderRegistry**: plugin-based registry for providers
//
// ## Design Principles
//
// 1. **Core owns parsing**: providers move raw documents, nothing more
// 2. **Deterministic**: canonical serialization is byte-stable
// 3. **All or nothing**: a partially fetched zone is never diffed
// 4. **Library-first**: every step is usable without the CLI

pub mod audit;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod traits;
pub mod validate;
pub mod xml;

// Re-export core types for convenience
pub use audit::{FileAuditLog, MemoryAuditLog};
pub use config::{AuditLogConfig, ChangeBatchLimits, ProviderConfig, SyncConfig};
pub use diff::{diff_documents, generate_change_batch};
pub use engine::{ChangePlan, Reconciler, SyncEvent};
pub use error::{Error, Result};
pub use fetch::{fetch_record_set_pages, merge_pages};
pub use model::{
    ChangeAction, ChangeBatch, ChangeInfo, DEFAULT_API_VERSION, HostedZone, HostedZonePage,
    PaginationCursor, RecordSet, RecordSetEntry, RecordSetPage, RecordType, ZoneId,
};
pub use normalize::normalize;
pub use registry::ProviderRegistry;
pub use resolve::resolve_zone;
pub use traits::{AuditLog, AuditRecord, ZoneProvider, ZoneProviderFactory};
pub use validate::{Violation, validate_change_batch};
