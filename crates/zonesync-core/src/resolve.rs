//! Zone name to provider identifier

use crate::error::{Error, Result};
use crate::model::{HostedZonePage, ZoneId};
use crate::traits::ZoneProvider;
use tracing::debug;

/// Find the identifier of the hosted zone named `zone_name`
///
/// Follows the listing's `NextMarker` pagination. Names compare exactly,
/// ignoring a trailing dot on either side. Fails with
/// [`Error::ZoneNotFound`] when no listed zone matches.
pub async fn resolve_zone(provider: &dyn ZoneProvider, zone_name: &str) -> Result<ZoneId> {
    let mut marker: Option<String> = None;

    loop {
        let body = provider.list_hosted_zones(marker.as_deref()).await?;
        let page = HostedZonePage::from_xml(&body)?;
        debug!("Listed {} hosted zones", page.zones.len());

        if let Some(zone) = page.zones.iter().find(|z| z.matches(zone_name)) {
            debug!("Zone {} resolved to {}", zone_name, zone.id);
            return Ok(zone.id.clone());
        }

        match page.next_marker {
            Some(next) if marker.as_deref() != Some(next.as_str()) => marker = Some(next),
            Some(next) => {
                return Err(Error::malformed(format!(
                    "hosted zone listing repeated marker {}",
                    next
                )));
            }
            None => return Err(Error::ZoneNotFound(zone_name.to_string())),
        }
    }
}
