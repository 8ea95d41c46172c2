//! Record sets and their canonical XML form

use crate::error::{Error, Result};
use crate::model::{NAMESPACE_PREFIX, namespace};
use crate::xml::{self, Element};
use std::fmt;
use std::str::FromStr;

/// Root element of a record-set document
pub const RECORD_SETS_TAG: &str = "ResourceRecordSets";

/// Element wrapping one record set
pub const RECORD_SET_TAG: &str = "ResourceRecordSet";

/// Routing metadata written between `SetIdentifier` and `TTL`, in schema order
const ROUTING_ELEMENTS: &[&str] = &[
    "Weight",
    "Region",
    "GeoLocation",
    "Failover",
    "MultiValueAnswer",
];

/// Metadata written after `ResourceRecords`, in schema order
const TRAILING_ELEMENTS: &[&str] = &[
    "AliasTarget",
    "HealthCheckId",
    "TrafficPolicyInstanceId",
    "CidrRoutingConfig",
    "GeoProximityLocation",
];

/// Position of an unmodeled element inside a serialized record set.
/// Unknown elements sort last and keep their relative order.
fn schema_rank(name: &str) -> usize {
    if let Some(i) = ROUTING_ELEMENTS.iter().position(|n| *n == name) {
        return i;
    }
    if let Some(i) = TRAILING_ELEMENTS.iter().position(|n| *n == name) {
        return ROUTING_ELEMENTS.len() + 1 + i;
    }
    usize::MAX
}

fn is_routing(name: &str) -> bool {
    schema_rank(name) < ROUTING_ELEMENTS.len()
}

/// DNS record type as understood by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Ds,
    Https,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Soa,
    Spf,
    Srv,
    Sshfp,
    Svcb,
    Tlsa,
    Txt,
    /// Any type this crate does not name; kept verbatim
    Other(String),
}

impl RecordType {
    /// Wire representation (e.g. `"AAAA"`)
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ds => "DS",
            RecordType::Https => "HTTPS",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Spf => "SPF",
            RecordType::Srv => "SRV",
            RecordType::Sshfp => "SSHFP",
            RecordType::Svcb => "SVCB",
            RecordType::Tlsa => "TLSA",
            RecordType::Txt => "TXT",
            RecordType::Other(other) => other,
        }
    }

    /// Parse the wire representation; unknown types become [`RecordType::Other`]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CAA" => RecordType::Caa,
            "CNAME" => RecordType::Cname,
            "DS" => RecordType::Ds,
            "HTTPS" => RecordType::Https,
            "MX" => RecordType::Mx,
            "NAPTR" => RecordType::Naptr,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SPF" => RecordType::Spf,
            "SRV" => RecordType::Srv,
            "SSHFP" => RecordType::Sshfp,
            "SVCB" => RecordType::Svcb,
            "TLSA" => RecordType::Tlsa,
            "TXT" => RecordType::Txt,
            other => RecordType::Other(other.to_string()),
        }
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_wire(s))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resource-record set
///
/// `extra` holds every child element the model does not name (weights,
/// failover, alias targets, health checks, ...) so that nothing returned by
/// the provider is dropped on the way back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetEntry {
    /// Owner name, as written (e.g. `www.example.com.`)
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Disambiguates weighted/latency/failover sets sharing name and type
    pub set_identifier: Option<String>,
    /// Time-to-live in seconds (absent for alias records)
    pub ttl: Option<u64>,
    /// Record values, one per `ResourceRecord`
    pub values: Vec<String>,
    /// Unmodeled routing metadata, verbatim
    pub extra: Vec<Element>,
}

impl RecordSetEntry {
    /// Create an entry with no TTL, values or metadata
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            set_identifier: None,
            ttl: None,
            values: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Append a value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Set the set identifier
    pub fn with_set_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.set_identifier = Some(identifier.into());
        self
    }

    /// Append an unmodeled metadata element
    pub fn with_extra(mut self, element: Element) -> Self {
        self.extra.push(element);
        self
    }

    /// Build an entry from a `<ResourceRecordSet>` element
    pub fn from_element(element: &Element) -> Result<Self> {
        if element.name != RECORD_SET_TAG {
            return Err(Error::invalid_input(format!(
                "expected <{}>, found <{}>",
                RECORD_SET_TAG, element.name
            )));
        }

        let mut name = None;
        let mut record_type = None;
        let mut set_identifier = None;
        let mut ttl = None;
        let mut values = Vec::new();
        let mut extra = Vec::new();

        for child in &element.children {
            let text = child.text.as_deref().unwrap_or_default();
            match child.name.as_str() {
                "Name" => name = Some(text.to_string()),
                "Type" => record_type = Some(RecordType::from_wire(text.trim())),
                "SetIdentifier" => set_identifier = Some(text.to_string()),
                "TTL" => {
                    let parsed = text.trim().parse::<u64>().map_err(|_| {
                        Error::invalid_input(format!("invalid TTL '{}'", text.trim()))
                    })?;
                    ttl = Some(parsed);
                }
                "ResourceRecords" => {
                    for record in &child.children {
                        if record.name != "ResourceRecord" {
                            return Err(Error::invalid_input(format!(
                                "unexpected <{}> in <ResourceRecords>",
                                record.name
                            )));
                        }
                        let value = record.find("Value").ok_or_else(|| {
                            Error::invalid_input("<ResourceRecord> without <Value>")
                        })?;
                        values.push(value.text.clone().unwrap_or_default());
                    }
                }
                _ => extra.push(child.clone()),
            }
        }

        let name = name.ok_or_else(|| Error::invalid_input("<ResourceRecordSet> without <Name>"))?;
        let record_type = record_type.ok_or_else(|| {
            Error::invalid_input(format!("<ResourceRecordSet> {} without <Type>", name))
        })?;

        Ok(Self {
            name,
            record_type,
            set_identifier,
            ttl,
            values,
            extra,
        })
    }

    /// Build the `<ResourceRecordSet>` element in canonical child order
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(RECORD_SET_TAG)
            .child(Element::with_text("Name", self.name.as_str()))
            .child(Element::with_text("Type", self.record_type.as_str()));

        if let Some(ref identifier) = self.set_identifier {
            element.push(Element::with_text("SetIdentifier", identifier.as_str()));
        }

        let mut extras: Vec<&Element> = self.extra.iter().collect();
        extras.sort_by_key(|e| schema_rank(&e.name));
        let (routing, trailing): (Vec<&Element>, Vec<&Element>) =
            extras.into_iter().partition(|e| is_routing(&e.name));

        for e in routing {
            element.push(e.clone());
        }

        if let Some(ttl) = self.ttl {
            element.push(Element::with_text("TTL", ttl.to_string()));
        }

        if !self.values.is_empty() {
            let mut records = Element::new("ResourceRecords");
            for value in &self.values {
                records.push(
                    Element::new("ResourceRecord").child(Element::with_text("Value", value.as_str())),
                );
            }
            element.push(records);
        }

        for e in trailing {
            element.push(e.clone());
        }

        element
    }

    /// Canonical serialized form; two entries are equivalent iff these match
    pub fn canonical_form(&self) -> Result<String> {
        self.to_element().to_xml(false)
    }

    /// Short human-readable label, e.g. `www.example.com. A`
    pub fn label(&self) -> String {
        match self.set_identifier {
            Some(ref id) => format!("{} {} [{}]", self.name, self.record_type, id),
            None => format!("{} {}", self.name, self.record_type),
        }
    }
}

/// An ordered collection of record sets: a remote snapshot or a desired state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    entries: Vec<RecordSetEntry>,
}

impl RecordSet {
    /// Create a record set from entries
    pub fn new(entries: Vec<RecordSetEntry>) -> Self {
        Self { entries }
    }

    /// Parse a `<ResourceRecordSets>` document
    ///
    /// Formatting whitespace is stripped before conversion.
    pub fn from_xml(input: &str) -> Result<Self> {
        let mut root = xml::parse(input)?;
        root.strip_whitespace();
        Self::from_element(&root)
    }

    /// Parse a `<ResourceRecordSets>` document that must declare the
    /// namespace of `api_version`
    pub fn from_versioned_xml(input: &str, api_version: &str) -> Result<Self> {
        let mut root = xml::parse(input)?;
        ensure_namespace(&root, api_version)?;
        root.strip_whitespace();
        Self::from_element(&root)
    }

    /// Convert a `<ResourceRecordSets>` element
    ///
    /// Only the root name is checked; see [`ensure_namespace`].
    ///
    /// Any other root is rejected with [`Error::InvalidArgument`].
    pub fn from_element(root: &Element) -> Result<Self> {
        ensure_record_sets(root)?;
        let entries = root
            .children
            .iter()
            .map(RecordSetEntry::from_element)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Build the `<ResourceRecordSets>` element for the given API version
    pub fn to_element(&self, api_version: &str) -> Element {
        let mut root = Element::new(RECORD_SETS_TAG).attribute("xmlns", namespace(api_version));
        for entry in &self.entries {
            root.push(entry.to_element());
        }
        root
    }

    /// Serialize as a complete document
    pub fn to_xml(&self, api_version: &str, indent: bool) -> Result<String> {
        self.to_element(api_version).to_document(indent)
    }

    /// Entries in order
    pub fn entries(&self) -> &[RecordSetEntry] {
        &self.entries
    }

    /// Mutable access to the entries
    pub fn entries_mut(&mut self) -> &mut Vec<RecordSetEntry> {
        &mut self.entries
    }

    /// Append an entry
    pub fn push(&mut self, entry: RecordSetEntry) {
        self.entries.push(entry);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries
    pub fn iter(&self) -> std::slice::Iter<'_, RecordSetEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for RecordSet {
    type Item = RecordSetEntry;
    type IntoIter = std::vec::IntoIter<RecordSetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<RecordSetEntry> for RecordSet {
    fn from_iter<I: IntoIterator<Item = RecordSetEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Check that `root` is a record-set container
pub fn ensure_record_sets(root: &Element) -> Result<()> {
    if root.name != RECORD_SETS_TAG {
        return Err(Error::invalid_argument(format!(
            "expected a <{}> document, found <{}>",
            RECORD_SETS_TAG, root.name
        )));
    }
    Ok(())
}

/// Check that `root` declares the namespace of `api_version`
///
/// A missing declaration is rejected like a foreign one.
pub fn ensure_namespace(root: &Element, api_version: &str) -> Result<()> {
    let expected = namespace(api_version);
    match root.namespace() {
        Some(found) if found == expected => Ok(()),
        found => Err(Error::invalid_argument(format!(
            "<{}> must declare xmlns=\"{}\", found {}",
            root.name,
            expected,
            found.map_or_else(|| "none".to_string(), |ns| format!("\"{}\"", ns))
        ))),
    }
}

/// API version named by the provider namespace `root` declares
pub fn namespace_api_version(root: &Element) -> Result<&str> {
    root.namespace()
        .and_then(|ns| ns.strip_prefix(NAMESPACE_PREFIX))
        .and_then(|rest| rest.strip_suffix('/'))
        .filter(|version| !version.is_empty() && !version.contains('/'))
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "<{}> does not declare a {}<version>/ namespace",
                root.name, NAMESPACE_PREFIX
            ))
        })
}
