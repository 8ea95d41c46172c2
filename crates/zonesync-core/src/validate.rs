//! Change batch validation against provider limits

use crate::config::ChangeBatchLimits;
use crate::model::ChangeBatch;
use std::fmt;

/// One reason a change batch would be rejected by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The batch contains no changes
    EmptyChangeset,
    /// More changes than the provider accepts in one batch
    TooManyChanges { count: usize, max: usize },
    /// More record values than the provider accepts in one batch
    TooManyValues { count: usize, max: usize },
    /// More value characters than the provider accepts in one batch
    TooManyValueChars { count: usize, max: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyChangeset => write!(f, "changeset must have at least one change"),
            Violation::TooManyChanges { count, max } => {
                write!(f, "changeset has {} changes: max is {}", count, max)
            }
            Violation::TooManyValues { count, max } => write!(
                f,
                "changeset has {} ResourceRecord values: max is {}",
                count, max
            ),
            Violation::TooManyValueChars { count, max } => write!(
                f,
                "changeset has {} chars in Value text: max is {}",
                count, max
            ),
        }
    }
}

/// Check a batch against `limits`
///
/// Every check runs; the result lists all violations and is empty when the
/// batch may be submitted.
pub fn validate_change_batch(batch: &ChangeBatch, limits: &ChangeBatchLimits) -> Vec<Violation> {
    let mut violations = Vec::new();

    if batch.is_empty() {
        violations.push(Violation::EmptyChangeset);
    }

    let changes = batch.len();
    if changes > limits.max_changes {
        violations.push(Violation::TooManyChanges {
            count: changes,
            max: limits.max_changes,
        });
    }

    let values = batch.value_count();
    if values > limits.max_values {
        violations.push(Violation::TooManyValues {
            count: values,
            max: limits.max_values,
        });
    }

    let chars = batch.value_chars();
    if chars > limits.max_value_chars {
        violations.push(Violation::TooManyValueChars {
            count: chars,
            max: limits.max_value_chars,
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeAction, RecordSetEntry, RecordType};

    fn batch_of(changes: usize, values_per_change: usize, value: &str) -> ChangeBatch {
        let mut batch = ChangeBatch::new("test");
        for i in 0..changes {
            let mut entry = RecordSetEntry::new(format!("h{}.example.com.", i), RecordType::Txt);
            for _ in 0..values_per_change {
                entry = entry.with_value(value);
            }
            batch.push(ChangeAction::Create(entry));
        }
        batch
    }

    #[test]
    fn test_empty_batch_rejected() {
        let violations = validate_change_batch(&ChangeBatch::new("x"), &ChangeBatchLimits::default());
        assert_eq!(violations, vec![Violation::EmptyChangeset]);
        assert_eq!(
            violations[0].to_string(),
            "changeset must have at least one change"
        );
    }

    #[test]
    fn test_change_count_boundary() {
        let limits = ChangeBatchLimits::default();
        assert!(validate_change_batch(&batch_of(100, 1, "v"), &limits).is_empty());

        let violations = validate_change_batch(&batch_of(101, 1, "v"), &limits);
        assert_eq!(
            violations,
            vec![Violation::TooManyChanges { count: 101, max: 100 }]
        );
        assert_eq!(violations[0].to_string(), "changeset has 101 changes: max is 100");
    }

    #[test]
    fn test_value_count_boundary() {
        let limits = ChangeBatchLimits::default();
        assert!(validate_change_batch(&batch_of(10, 100, "v"), &limits).is_empty());

        let mut batch = batch_of(10, 100, "v");
        batch.push(ChangeAction::Create(
            RecordSetEntry::new("extra.example.com.", RecordType::A).with_value("v"),
        ));
        assert_eq!(
            validate_change_batch(&batch, &limits),
            vec![Violation::TooManyValues { count: 1001, max: 1000 }]
        );
    }

    #[test]
    fn test_value_chars_boundary() {
        let limits = ChangeBatchLimits::default();
        let exact = "x".repeat(10_000);
        assert!(validate_change_batch(&batch_of(1, 1, &exact), &limits).is_empty());

        let over = "x".repeat(10_001);
        let violations = validate_change_batch(&batch_of(1, 1, &over), &limits);
        assert_eq!(
            violations,
            vec![Violation::TooManyValueChars { count: 10_001, max: 10_000 }]
        );
        assert_eq!(
            violations[0].to_string(),
            "changeset has 10001 chars in Value text: max is 10000"
        );
    }

    #[test]
    fn test_all_violations_reported() {
        let limits = ChangeBatchLimits {
            max_changes: 1,
            max_values: 1,
            max_value_chars: 1,
        };
        let violations = validate_change_batch(&batch_of(2, 1, "ab"), &limits);
        assert_eq!(violations.len(), 3);
    }
}
