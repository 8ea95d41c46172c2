//! Change batches and the provider's acknowledgement of them

use crate::error::{Error, Result};
use crate::model::namespace;
use crate::model::record::RecordSetEntry;
use crate::xml::{self, Element};

/// One whole-entry mutation
///
/// The provider has no partial update: changing a TTL or a value is a
/// `Delete` of the old entry followed by a `Create` of the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    /// Create the entry
    Create(RecordSetEntry),
    /// Delete the entry (must match the remote entry exactly)
    Delete(RecordSetEntry),
}

impl ChangeAction {
    /// The entry this action carries
    pub fn entry(&self) -> &RecordSetEntry {
        match self {
            ChangeAction::Create(entry) | ChangeAction::Delete(entry) => entry,
        }
    }

    /// Wire name of the action
    pub fn action_name(&self) -> &'static str {
        match self {
            ChangeAction::Create(_) => "CREATE",
            ChangeAction::Delete(_) => "DELETE",
        }
    }

    /// Build the `<Change>` element
    pub fn to_element(&self) -> Element {
        Element::new("Change")
            .child(Element::with_text("Action", self.action_name()))
            .child(self.entry().to_element())
    }
}

/// An ordered list of changes submitted atomically, plus a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Free-text comment stored by the provider with the change
    pub comment: String,
    /// Changes in submission order
    pub changes: Vec<ChangeAction>,
}

impl ChangeBatch {
    /// Create an empty batch
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            changes: Vec::new(),
        }
    }

    /// Comment identifying who generated a batch, where and when
    pub fn default_comment() -> String {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        let host = local_hostname();
        format!(
            "Generated by zonesync for {}@{} at {}.",
            user,
            host,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Append a change
    pub fn push(&mut self, change: ChangeAction) {
        self.changes.push(change);
    }

    /// Number of changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the batch has no changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of `Create` actions
    pub fn creates(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ChangeAction::Create(_)))
            .count()
    }

    /// Number of `Delete` actions
    pub fn deletes(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ChangeAction::Delete(_)))
            .count()
    }

    /// Total number of record values across all changes
    pub fn value_count(&self) -> usize {
        self.changes.iter().map(|c| c.entry().values.len()).sum()
    }

    /// Total characters of all record values across all changes
    pub fn value_chars(&self) -> usize {
        self.changes
            .iter()
            .flat_map(|c| c.entry().values.iter())
            .map(|v| v.chars().count())
            .sum()
    }

    /// Build the `<ChangeResourceRecordSetsRequest>` element
    pub fn to_element(&self, api_version: &str) -> Element {
        let mut changes = Element::new("Changes");
        for change in &self.changes {
            changes.push(change.to_element());
        }

        Element::new("ChangeResourceRecordSetsRequest")
            .attribute("xmlns", namespace(api_version))
            .child(
                Element::new("ChangeBatch")
                    .child(Element::with_text("Comment", self.comment.as_str()))
                    .child(changes),
            )
    }

    /// Serialize as a complete request document
    pub fn to_xml(&self, api_version: &str, indent: bool) -> Result<String> {
        self.to_element(api_version).to_document(indent)
    }
}

/// Provider acknowledgement of a submitted batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
    /// Change identifier, e.g. `/change/C2682N5HXP0BZ4`
    pub id: String,
    /// `PENDING` or `INSYNC`
    pub status: String,
    /// Submission timestamp as reported by the provider
    pub submitted_at: Option<String>,
    /// Comment echoed back by the provider
    pub comment: Option<String>,
}

impl ChangeInfo {
    /// Parse a `<ChangeResourceRecordSetsResponse>` document
    pub fn from_xml(input: &str) -> Result<Self> {
        let mut root = xml::parse(input)?;
        root.strip_whitespace();

        if root.name != "ChangeResourceRecordSetsResponse" {
            return Err(Error::malformed(format!(
                "expected <ChangeResourceRecordSetsResponse>, found <{}>",
                root.name
            )));
        }

        let info = root
            .find("ChangeInfo")
            .ok_or_else(|| Error::malformed("response without <ChangeInfo>"))?;
        let id = info
            .find_text("Id")
            .ok_or_else(|| Error::malformed("<ChangeInfo> without <Id>"))?;
        let status = info
            .find_text("Status")
            .ok_or_else(|| Error::malformed("<ChangeInfo> without <Status>"))?;

        Ok(Self {
            id: id.trim().to_string(),
            status: status.trim().to_string(),
            submitted_at: info.find_text("SubmittedAt").map(|s| s.trim().to_string()),
            comment: info.find_text("Comment").map(str::to_string),
        })
    }

    /// Identifier without the `/change/` prefix
    pub fn short_id(&self) -> &str {
        self.id.strip_prefix("/change/").unwrap_or(&self.id)
    }
}

/// Host name from the operating system, not the shell environment
fn local_hostname() -> String {
    let host = gethostname::gethostname().to_string_lossy().into_owned();
    if host.is_empty() {
        "unknown-host".to_string()
    } else {
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordType;

    fn entry(name: &str, value: &str) -> RecordSetEntry {
        RecordSetEntry::new(name, RecordType::A)
            .with_ttl(300)
            .with_value(value)
    }

    #[test]
    fn test_batch_document_layout() {
        let mut batch = ChangeBatch::new("Generated by tests");
        batch.push(ChangeAction::Delete(entry("a.example.com.", "192.0.2.1")));
        batch.push(ChangeAction::Create(entry("a.example.com.", "192.0.2.2")));

        let xml = batch.to_element("2013-04-01").to_xml(false).unwrap();
        assert_eq!(
            xml,
            "<ChangeResourceRecordSetsRequest xmlns=\"https://route53.amazonaws.com/doc/2013-04-01/\">\
             <ChangeBatch><Comment>Generated by tests</Comment><Changes>\
             <Change><Action>DELETE</Action><ResourceRecordSet><Name>a.example.com.</Name><Type>A</Type><TTL>300</TTL>\
             <ResourceRecords><ResourceRecord><Value>192.0.2.1</Value></ResourceRecord></ResourceRecords></ResourceRecordSet></Change>\
             <Change><Action>CREATE</Action><ResourceRecordSet><Name>a.example.com.</Name><Type>A</Type><TTL>300</TTL>\
             <ResourceRecords><ResourceRecord><Value>192.0.2.2</Value></ResourceRecord></ResourceRecords></ResourceRecordSet></Change>\
             </Changes></ChangeBatch></ChangeResourceRecordSetsRequest>"
        );
    }

    #[test]
    fn test_counters() {
        let mut batch = ChangeBatch::new("c");
        batch.push(ChangeAction::Delete(entry("a.", "1234")));
        batch.push(ChangeAction::Create(
            entry("a.", "12").with_value("héllo"),
        ));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.deletes(), 1);
        assert_eq!(batch.creates(), 1);
        assert_eq!(batch.value_count(), 3);
        assert_eq!(batch.value_chars(), 4 + 2 + 5);
    }

    #[test]
    fn test_default_comment_mentions_generator() {
        let comment = ChangeBatch::default_comment();
        assert!(comment.starts_with("Generated by zonesync for "));
    }

    #[test]
    fn test_default_comment_uses_system_hostname() {
        let host = gethostname::gethostname().to_string_lossy().into_owned();
        assert!(!host.is_empty());
        let comment = ChangeBatch::default_comment();
        assert!(comment.contains(&format!("@{} at ", host)));
        assert!(!comment.contains("unknown-host"));
    }

    #[test]
    fn test_change_info_parse() {
        let info = ChangeInfo::from_xml(
            r#"<?xml version="1.0"?>
<ChangeResourceRecordSetsResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
  <ChangeInfo>
    <Id>/change/C2682N5HXP0BZ4</Id>
    <Status>PENDING</Status>
    <SubmittedAt>2024-01-01T00:00:00.000Z</SubmittedAt>
  </ChangeInfo>
</ChangeResourceRecordSetsResponse>"#,
        )
        .unwrap();
        assert_eq!(info.short_id(), "C2682N5HXP0BZ4");
        assert_eq!(info.status, "PENDING");
        assert_eq!(info.submitted_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(info.comment, None);
    }

    #[test]
    fn test_change_info_rejects_other_documents() {
        assert!(matches!(
            ChangeInfo::from_xml("<ErrorResponse/>"),
            Err(Error::MalformedResponse(_))
        ));
    }
}
