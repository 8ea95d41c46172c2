//! Paged listing responses

use crate::error::{Error, Result};
use crate::model::ZoneId;
use crate::model::record::{RecordSet, RecordSetEntry};
use crate::xml::{self, Element};

/// Continuation state for a record-set listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    /// `NextRecordName`
    pub name: String,
    /// `NextRecordType`
    pub record_type: String,
    /// `NextRecordIdentifier`, only present for routed entries
    pub identifier: Option<String>,
}

impl PaginationCursor {
    /// Query parameters for the next page request
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("name", self.name.as_str()), ("type", self.record_type.as_str())];
        if let Some(identifier) = &self.identifier {
            pairs.push(("identifier", identifier.as_str()));
        }
        pairs
    }
}

/// One parsed `ListResourceRecordSetsResponse`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetPage {
    /// Entries in response order
    pub entries: Vec<RecordSetEntry>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Cursor for the next page; always set when `is_truncated`
    pub next: Option<PaginationCursor>,
    /// Page size the provider applied
    pub max_items: Option<u32>,
}

impl RecordSetPage {
    /// Parse a listing response document
    pub fn from_xml(input: &str) -> Result<Self> {
        let root = parse_root(input, "ListResourceRecordSetsResponse")?;

        let entries = match root.find("ResourceRecordSets") {
            Some(container) => RecordSet::from_element(container)?.into_iter().collect(),
            None => Vec::new(),
        };

        let is_truncated = parse_flag(&root, "IsTruncated")?;
        let max_items = match root.find_text("MaxItems") {
            Some(text) => Some(text.trim().parse::<u32>().map_err(|_| {
                Error::malformed(format!("MaxItems is not a number: {:?}", text))
            })?),
            None => None,
        };

        let next = if is_truncated {
            let name = root
                .find_text("NextRecordName")
                .ok_or_else(|| Error::malformed("truncated page without NextRecordName"))?;
            let record_type = root
                .find_text("NextRecordType")
                .ok_or_else(|| Error::malformed("truncated page without NextRecordType"))?;
            Some(PaginationCursor {
                name: name.trim().to_string(),
                record_type: record_type.trim().to_string(),
                identifier: root
                    .find_text("NextRecordIdentifier")
                    .map(|s| s.trim().to_string()),
            })
        } else {
            None
        };

        Ok(Self {
            entries,
            is_truncated,
            next,
            max_items,
        })
    }
}

/// One hosted zone from a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Identifier with the `/hostedzone/` prefix stripped
    pub id: ZoneId,
    /// Fully qualified zone name as returned (usually dot-terminated)
    pub name: String,
    /// Whether the zone is private
    pub private: bool,
    /// Number of record sets, when reported
    pub record_set_count: Option<u64>,
}

impl HostedZone {
    /// Trailing-dot-insensitive name comparison
    pub fn matches(&self, zone_name: &str) -> bool {
        self.name.trim_end_matches('.') == zone_name.trim_end_matches('.')
    }
}

/// One parsed `ListHostedZonesResponse`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZonePage {
    /// Zones in response order
    pub zones: Vec<HostedZone>,
    /// Marker for the next listing request
    pub next_marker: Option<String>,
}

impl HostedZonePage {
    /// Parse a hosted-zone listing document
    pub fn from_xml(input: &str) -> Result<Self> {
        let root = parse_root(input, "ListHostedZonesResponse")?;

        let mut zones = Vec::new();
        if let Some(container) = root.find("HostedZones") {
            for zone in container.find_all("HostedZone") {
                let id = zone
                    .find_text("Id")
                    .ok_or_else(|| Error::malformed("<HostedZone> without <Id>"))?;
                let name = zone
                    .find_text("Name")
                    .ok_or_else(|| Error::malformed("<HostedZone> without <Name>"))?;
                let private = zone
                    .find("Config")
                    .map(|config| parse_flag(config, "PrivateZone"))
                    .transpose()?
                    .unwrap_or(false);
                let record_set_count = zone
                    .find_text("ResourceRecordSetCount")
                    .and_then(|s| s.trim().parse::<u64>().ok());

                zones.push(HostedZone {
                    id: ZoneId::from_provider(id),
                    name: name.trim().to_string(),
                    private,
                    record_set_count,
                });
            }
        }

        let next_marker = if parse_flag(&root, "IsTruncated")? {
            Some(
                root.find_text("NextMarker")
                    .ok_or_else(|| Error::malformed("truncated zone listing without NextMarker"))?
                    .trim()
                    .to_string(),
            )
        } else {
            None
        };

        Ok(Self { zones, next_marker })
    }
}

fn parse_root(input: &str, expected: &str) -> Result<Element> {
    let mut root = xml::parse(input)?;
    root.strip_whitespace();
    if root.name != expected {
        return Err(Error::malformed(format!(
            "expected <{}>, found <{}>",
            expected, root.name
        )));
    }
    Ok(root)
}

fn parse_flag(parent: &Element, name: &str) -> Result<bool> {
    match parent.find_text(name).map(str::trim) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(Error::malformed(format!(
            "{} is not a boolean: {:?}",
            name, other
        ))),
    }
}
