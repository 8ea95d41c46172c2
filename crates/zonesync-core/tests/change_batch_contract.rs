//! Contract Test: Change Batch Limits & Request Document
//!
//! Constraints verified:
//! - Limits hold at the boundary and fail one past it
//! - Every violation is reported, not only the first
//! - The request document lists DELETEs before CREATEs under the API namespace

mod common;

use common::*;
use zonesync_core::model::{ChangeAction, ChangeBatch, RecordSetEntry, RecordType};
use zonesync_core::xml;
use zonesync_core::{ChangeBatchLimits, Violation, validate_change_batch};

fn batch(changes: usize, values_each: usize, value_len: usize) -> ChangeBatch {
    let mut batch = ChangeBatch::new("limits");
    let value = "v".repeat(value_len);
    for i in 0..changes {
        let mut entry = RecordSetEntry::new(format!("r{}.example.com.", i), RecordType::Txt).with_ttl(60);
        for _ in 0..values_each {
            entry = entry.with_value(value.clone());
        }
        batch.push(ChangeAction::Create(entry));
    }
    batch
}

#[test]
fn hundred_changes_pass_and_hundred_one_fail() {
    let limits = ChangeBatchLimits::default();
    assert!(validate_change_batch(&batch(100, 1, 1), &limits).is_empty());
    assert_eq!(
        validate_change_batch(&batch(101, 1, 1), &limits),
        vec![Violation::TooManyChanges { count: 101, max: 100 }]
    );
}

#[test]
fn thousand_values_pass_and_thousand_one_fail() {
    let limits = ChangeBatchLimits::default();
    assert!(validate_change_batch(&batch(1, 1000, 1), &limits).is_empty());
    assert_eq!(
        validate_change_batch(&batch(1, 1001, 1), &limits),
        vec![Violation::TooManyValues { count: 1001, max: 1000 }]
    );
}

#[test]
fn ten_thousand_chars_pass_and_one_more_fails() {
    let limits = ChangeBatchLimits::default();
    assert!(validate_change_batch(&batch(4, 1, 2500), &limits).is_empty());

    let mut over = batch(4, 1, 2500);
    over.push(ChangeAction::Delete(
        RecordSetEntry::new("x.example.com.", RecordType::Txt).with_value("v"),
    ));
    assert_eq!(
        validate_change_batch(&over, &limits),
        vec![Violation::TooManyValueChars { count: 10001, max: 10000 }]
    );
}

#[test]
fn empty_batch_is_rejected() {
    let violations = validate_change_batch(&ChangeBatch::new("empty"), &ChangeBatchLimits::default());
    assert_eq!(violations, vec![Violation::EmptyChangeset]);
}

#[test]
fn all_violations_are_listed() {
    let violations = validate_change_batch(&batch(101, 10, 10), &ChangeBatchLimits::default());
    assert_eq!(
        violations,
        vec![
            Violation::TooManyChanges { count: 101, max: 100 },
            Violation::TooManyValues { count: 1010, max: 1000 },
            Violation::TooManyValueChars { count: 10100, max: 10000 },
        ]
    );
}

#[test]
fn custom_limits_apply() {
    let limits = ChangeBatchLimits {
        max_changes: 2,
        ..ChangeBatchLimits::default()
    };
    assert_eq!(validate_change_batch(&batch(3, 1, 1), &limits).len(), 1);
}

#[test]
fn request_document_orders_deletes_first() {
    let old = xml::parse(&record_sets_doc(&[rrset("a.example.com.", "A", 900, &["192.0.2.1"])])).unwrap();
    let new = xml::parse(&record_sets_doc(&[rrset("a.example.com.", "A", 60, &["192.0.2.1"])])).unwrap();
    let batch = zonesync_core::diff_documents(&old, &new, Some("replace ttl".into()))
        .unwrap()
        .unwrap();

    let request = xml::parse(&batch.to_xml("2013-04-01", true).unwrap()).unwrap();
    assert_eq!(request.name, "ChangeResourceRecordSetsRequest");
    assert_eq!(request.namespace(), Some(NS));

    let change_batch = request.find("ChangeBatch").unwrap();
    assert_eq!(change_batch.find_text("Comment"), Some("replace ttl"));

    let actions: Vec<&str> = change_batch
        .find("Changes")
        .unwrap()
        .find_all("Change")
        .filter_map(|c| c.find_text("Action"))
        .collect();
    assert_eq!(actions, vec!["DELETE", "CREATE"]);
}
