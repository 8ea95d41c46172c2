// # Zone Provider Trait
//
// Defines the transport interface to the authoritative DNS provider.
//
// ## Implementations
//
// - Route 53: `zonesync-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::{PaginationCursor, ZoneProvider};
//
// async fn first_page(provider: &dyn ZoneProvider) -> zonesync_core::Result<String> {
//     // Raw ListResourceRecordSetsResponse document
//     provider.list_record_sets(&zone_id, None).await
// }
// ```

use crate::model::{PaginationCursor, ZoneId};
use async_trait::async_trait;

/// Trait for DNS provider transports
///
/// A provider moves documents between the core and the remote API. It
/// returns response bodies as raw XML; parsing, diffing and validation are
/// owned by the core.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoint only
/// - ✅ Sign requests with their credentials
/// - ✅ Map transport failures to [`crate::Error`] variants
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Retry or back off (a failed call aborts the reconciliation)
/// - ❌ Cache responses beyond a single request
/// - ❌ Follow pagination on their own (owned by the fetcher)
/// - ❌ Decide which changes to submit (owned by the `Reconciler`)
///
/// Providers are stateless and single-shot: one API call per invocation.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// List hosted zones, one page at a time
    ///
    /// # Parameters
    ///
    /// - `marker`: `NextMarker` from the previous page, `None` for the first
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the raw `ListHostedZonesResponse` document
    /// - `Err(Error)`: transport or authentication failure
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<String, crate::Error>;

    /// List one page of a zone's record sets
    ///
    /// # Parameters
    ///
    /// - `zone_id`: the zone to list
    /// - `cursor`: continuation from the previous page, `None` for the first
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the raw `ListResourceRecordSetsResponse` document
    /// - `Err(Error)`: transport or authentication failure
    async fn list_record_sets(
        &self,
        zone_id: &ZoneId,
        cursor: Option<&PaginationCursor>,
    ) -> Result<String, crate::Error>;

    /// Submit a change batch
    ///
    /// The batch is applied atomically by the provider: either every change
    /// succeeds or none does.
    ///
    /// # Parameters
    ///
    /// - `zone_id`: the zone to change
    /// - `request_xml`: a complete `ChangeResourceRecordSetsRequest` document
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the raw `ChangeResourceRecordSetsResponse` document
    /// - `Err(Error)`: rejection (with the provider's messages verbatim) or
    ///   transport failure
    async fn change_record_sets(
        &self,
        zone_id: &ZoneId,
        request_xml: &str,
    ) -> Result<String, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Whether `change_record_sets` answers without applying anything
    ///
    /// Submissions through a dry-run provider are never audited.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Helper trait for constructing zone providers from configuration
pub trait ZoneProviderFactory: Send + Sync {
    /// Create a ZoneProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneProvider>, crate::Error>;
}
