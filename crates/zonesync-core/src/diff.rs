//! Minimal change batch between two record sets

use crate::error::Result;
use crate::model::{
    ChangeAction, ChangeBatch, RecordSet, ensure_namespace, ensure_record_sets, namespace_api_version,
};
use crate::normalize::normalize;
use crate::xml::Element;
use std::collections::HashSet;
use tracing::debug;

/// Compute the change batch that turns `old` into `new`
///
/// Both sides must already be normalized. Returns `None` when their
/// canonical forms are identical. Otherwise the batch deletes every entry of
/// `old` missing from `new` (in `old` order), then creates every entry of
/// `new` missing from `old` (in `new` order).
///
/// Without a `comment` one naming the user, host and time is generated.
pub fn generate_change_batch(
    old: &RecordSet,
    new: &RecordSet,
    comment: Option<String>,
) -> Result<Option<ChangeBatch>> {
    let old_forms = canonical_forms(old)?;
    let new_forms = canonical_forms(new)?;

    let old_set: HashSet<&str> = old_forms.iter().map(String::as_str).collect();
    let new_set: HashSet<&str> = new_forms.iter().map(String::as_str).collect();

    if old_set == new_set {
        return Ok(None);
    }

    let mut batch = ChangeBatch::new(comment.unwrap_or_else(ChangeBatch::default_comment));

    for (entry, form) in old.iter().zip(&old_forms) {
        if !new_set.contains(form.as_str()) {
            debug!("REMOVED: {}", form);
            batch.push(ChangeAction::Delete(entry.clone()));
        }
    }

    for (entry, form) in new.iter().zip(&new_forms) {
        if !old_set.contains(form.as_str()) {
            debug!("ADDED: {}", form);
            batch.push(ChangeAction::Create(entry.clone()));
        }
    }

    Ok(Some(batch))
}

/// Diff two `<ResourceRecordSets>` element trees
///
/// Any other root fails with [`crate::Error::InvalidArgument`], as do roots
/// that do not declare the same provider namespace. Both sides are converted
/// and normalized before diffing.
pub fn diff_documents(
    old: &Element,
    new: &Element,
    comment: Option<String>,
) -> Result<Option<ChangeBatch>> {
    ensure_record_sets(old)?;
    ensure_record_sets(new)?;
    ensure_namespace(new, namespace_api_version(old)?)?;

    let mut old = document_to_record_set(old)?;
    let mut new = document_to_record_set(new)?;
    normalize(&mut old);
    normalize(&mut new);

    generate_change_batch(&old, &new, comment)
}

/// Convert a record-set element tree, dropping formatting whitespace
pub(crate) fn document_to_record_set(root: &Element) -> Result<RecordSet> {
    let mut root = root.clone();
    root.strip_whitespace();
    RecordSet::from_element(&root)
}

fn canonical_forms(set: &RecordSet) -> Result<Vec<String>> {
    set.iter().map(|entry| entry.canonical_form()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::model::{RecordSetEntry, RecordType};

    fn a(name: &str, ttl: u64, value: &str) -> RecordSetEntry {
        RecordSetEntry::new(name, RecordType::A)
            .with_ttl(ttl)
            .with_value(value)
    }

    #[test]
    fn test_identical_sets_produce_nothing() {
        let set = RecordSet::new(vec![a("a.example.com.", 300, "192.0.2.1")]);
        assert!(generate_change_batch(&set, &set, None).unwrap().is_none());
    }

    #[test]
    fn test_entry_order_is_irrelevant() {
        let old = RecordSet::new(vec![a("a.", 1, "1"), a("b.", 1, "2")]);
        let new = RecordSet::new(vec![a("b.", 1, "2"), a("a.", 1, "1")]);
        assert!(generate_change_batch(&old, &new, None).unwrap().is_none());
    }

    #[test]
    fn test_ttl_change_is_delete_then_create() {
        let old = RecordSet::new(vec![a("a.example.com.", 900, "192.0.2.1")]);
        let new = RecordSet::new(vec![a("a.example.com.", 60, "192.0.2.1")]);
        let batch = generate_change_batch(&old, &new, Some("ttl".into()))
            .unwrap()
            .unwrap();

        assert_eq!(batch.comment, "ttl");
        assert_eq!(
            batch.changes,
            vec![
                ChangeAction::Delete(a("a.example.com.", 900, "192.0.2.1")),
                ChangeAction::Create(a("a.example.com.", 60, "192.0.2.1")),
            ]
        );
    }

    #[test]
    fn test_deletes_follow_old_order_and_creates_follow_new_order() {
        let old = RecordSet::new(vec![a("z.", 1, "1"), a("keep.", 1, "1"), a("y.", 1, "1")]);
        let new = RecordSet::new(vec![a("c.", 1, "1"), a("keep.", 1, "1"), a("b.", 1, "1")]);
        let batch = generate_change_batch(&old, &new, None).unwrap().unwrap();
        let labels: Vec<(&str, &str)> = batch
            .changes
            .iter()
            .map(|c| (c.action_name(), c.entry().name.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("DELETE", "z."), ("DELETE", "y."), ("CREATE", "c."), ("CREATE", "b.")]
        );
    }

    #[test]
    fn test_generated_comment() {
        let new = RecordSet::new(vec![a("a.", 1, "1")]);
        let batch = generate_change_batch(&RecordSet::default(), &new, None)
            .unwrap()
            .unwrap();
        assert!(batch.comment.starts_with("Generated by zonesync for "));
    }

    #[test]
    fn test_documents_with_wrong_root_rejected() {
        let good = Element::new("ResourceRecordSets");
        let bad = Element::new("ChangeResourceRecordSetsRequest");
        assert!(matches!(
            diff_documents(&good, &bad, None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            diff_documents(&bad, &good, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_documents_in_other_namespace_rejected() {
        let current = RecordSet::default().to_element("2013-04-01");
        let older = RecordSet::default().to_element("2012-12-12");
        let bare = Element::new("ResourceRecordSets");
        let pairs = [
            (&current, &older),
            (&older, &current),
            (&current, &bare),
            (&bare, &current),
        ];
        for (old, new) in pairs {
            assert!(matches!(
                diff_documents(old, new, None),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(diff_documents(&older, &older, None).unwrap().is_none());
    }

    #[test]
    fn test_documents_normalized_before_diff() {
        let old = RecordSet::new(vec![
            RecordSetEntry::new("\\052.example.com.", RecordType::A)
                .with_ttl(60)
                .with_value("192.0.2.1")
                .with_value("192.0.2.2"),
        ])
        .to_element("2013-04-01");
        let new = RecordSet::new(vec![
            RecordSetEntry::new("*.example.com.", RecordType::A)
                .with_ttl(60)
                .with_value("192.0.2.2")
                .with_value("192.0.2.1"),
        ])
        .to_element("2013-04-01");
        assert!(diff_documents(&old, &new, None).unwrap().is_none());
    }
}
