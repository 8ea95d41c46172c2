//! Record-set data model and the provider's document formats

pub mod change;
pub mod page;
pub mod record;

pub use change::{ChangeAction, ChangeBatch, ChangeInfo};
pub use page::{HostedZone, HostedZonePage, PaginationCursor, RecordSetPage};
pub use record::{
    RecordSet, RecordSetEntry, RecordType, ensure_namespace, ensure_record_sets, namespace_api_version,
};

use std::fmt;

/// API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "2013-04-01";

/// Every provider namespace starts with this, followed by `<api-version>/`
pub const NAMESPACE_PREFIX: &str = "https://route53.amazonaws.com/doc/";

/// XML namespace for a given API version
pub fn namespace(api_version: &str) -> String {
    format!("{}{}/", NAMESPACE_PREFIX, api_version)
}

/// Provider identifier of a hosted zone
///
/// Stored without the `/hostedzone/` prefix the listing API returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Wrap a bare identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build from the `Id` field of a listing (`/hostedzone/Z123` or `Z123`)
    pub fn from_provider(id: &str) -> Self {
        let id = id.trim();
        Self(id.strip_prefix("/hostedzone/").unwrap_or(id).to_string())
    }

    /// Bare identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
