//! Canonicalization of record sets
//!
//! After normalization two record sets describing the same DNS data compare
//! equal entry-by-entry through [`RecordSetEntry::canonical_form`].

use crate::model::{RecordSet, RecordSetEntry};
use tracing::info;

/// Wildcard label as written by operators
pub const WILDCARD_PREFIX: &str = "*.";

/// Wildcard label as returned by the provider
pub const ESCAPED_WILDCARD_PREFIX: &str = "\\052.";

/// Normalize every entry of `record_set` in place
///
/// Idempotent: normalizing twice yields the same result as normalizing once.
pub fn normalize(record_set: &mut RecordSet) -> &mut RecordSet {
    for entry in record_set.entries_mut() {
        normalize_entry(entry);
    }
    record_set
}

/// Normalize one entry in place
pub fn normalize_entry(entry: &mut RecordSetEntry) {
    entry.values.sort();

    if let Some(rest) = entry.name.strip_prefix(WILDCARD_PREFIX) {
        let escaped = format!("{}{}", ESCAPED_WILDCARD_PREFIX, rest);
        info!("Rewriting wildcard name {} as {}", entry.name, escaped);
        entry.name = escaped;
    }

    for element in &mut entry.extra {
        element.strip_whitespace();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordType;
    use crate::xml::Element;

    #[test]
    fn test_values_sorted() {
        let mut set = RecordSet::new(vec![
            RecordSetEntry::new("example.com.", RecordType::Ns)
                .with_value("ns-2.example.net.")
                .with_value("ns-1.example.net."),
        ]);
        normalize(&mut set);
        assert_eq!(
            set.entries()[0].values,
            vec!["ns-1.example.net.", "ns-2.example.net."]
        );
    }

    #[test]
    fn test_wildcard_escaped() {
        let mut entry = RecordSetEntry::new("*.example.com.", RecordType::A);
        normalize_entry(&mut entry);
        assert_eq!(entry.name, "\\052.example.com.");

        // Already escaped names and inner asterisks are left alone
        normalize_entry(&mut entry);
        assert_eq!(entry.name, "\\052.example.com.");
        let mut inner = RecordSetEntry::new("a.*.example.com.", RecordType::A);
        normalize_entry(&mut inner);
        assert_eq!(inner.name, "a.*.example.com.");
    }

    #[test]
    fn test_extra_whitespace_stripped() {
        let mut alias = Element::new("AliasTarget")
            .child(Element::with_text("HostedZoneId", "Z2FDTNDATAQYW2"))
            .child(Element::with_text("DNSName", "d111.cloudfront.net."));
        alias.text = Some("\n    ".to_string());
        let mut entry = RecordSetEntry::new("example.com.", RecordType::A).with_extra(alias);
        normalize_entry(&mut entry);
        assert_eq!(entry.extra[0].text, None);
    }

    #[test]
    fn test_idempotent() {
        let mut set = RecordSet::new(vec![
            RecordSetEntry::new("*.example.com.", RecordType::Txt)
                .with_ttl(60)
                .with_value("\"b\"")
                .with_value("\"a\""),
        ]);
        normalize(&mut set);
        let once = set.clone();
        normalize(&mut set);
        assert_eq!(set, once);
    }
}
