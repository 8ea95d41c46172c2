//! Core traits for zonesync
//!
//! - [`ZoneProvider`]: Transport to the DNS provider's API
//! - [`AuditLog`]: Durable record of submitted change batches

pub mod audit_log;
pub mod zone_provider;

pub use audit_log::{AuditLog, AuditRecord};
pub use zone_provider::{ZoneProvider, ZoneProviderFactory};
