//! Test doubles and document builders for contract tests
//!
//! The scripted provider replays queued responses and records every call,
//! so tests can check both what the core parsed and what it asked for.

#![allow(dead_code)]

use zonesync_core::config::{ProviderConfig, SyncConfig};
use zonesync_core::error::{Error, Result};
use zonesync_core::model::{PaginationCursor, ZoneId};
use zonesync_core::traits::ZoneProvider;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

type Script = Arc<Mutex<VecDeque<Result<String>>>>;

/// A ZoneProvider that replays scripted responses
///
/// Clones share scripts and call records, so a test can keep one clone after
/// handing another to the Reconciler.
#[derive(Clone, Default)]
pub struct ScriptedZoneProvider {
    zone_pages: Script,
    record_pages: Script,
    change_responses: Script,
    /// Markers passed to list_hosted_zones, in call order
    markers: Arc<Mutex<Vec<Option<String>>>>,
    /// Cursors passed to list_record_sets, in call order
    cursors: Arc<Mutex<Vec<Option<PaginationCursor>>>>,
    /// Request documents passed to change_record_sets
    submitted: Arc<Mutex<Vec<String>>>,
    change_call_count: Arc<AtomicUsize>,
    dry_run: bool,
}

impl ScriptedZoneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone_page(self, body: impl Into<String>) -> Self {
        self.zone_pages.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn with_record_page(self, body: impl Into<String>) -> Self {
        self.record_pages.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn with_record_error(self, error: Error) -> Self {
        self.record_pages.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_change_response(self, body: impl Into<String>) -> Self {
        self.change_responses.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn with_change_error(self, error: Error) -> Self {
        self.change_responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Answer change submissions without applying them
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn markers(&self) -> Vec<Option<String>> {
        self.markers.lock().unwrap().clone()
    }

    pub fn cursors(&self) -> Vec<Option<PaginationCursor>> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn change_call_count(&self) -> usize {
        self.change_call_count.load(Ordering::SeqCst)
    }
}

fn next(script: &Script, what: &str) -> Result<String> {
    script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(Error::Other(format!("no scripted {} left", what))))
}

#[async_trait::async_trait]
impl ZoneProvider for ScriptedZoneProvider {
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<String> {
        self.markers.lock().unwrap().push(marker.map(str::to_string));
        next(&self.zone_pages, "zone page")
    }

    async fn list_record_sets(
        &self,
        _zone_id: &ZoneId,
        cursor: Option<&PaginationCursor>,
    ) -> Result<String> {
        self.cursors.lock().unwrap().push(cursor.cloned());
        next(&self.record_pages, "record page")
    }

    async fn change_record_sets(&self, _zone_id: &ZoneId, request_xml: &str) -> Result<String> {
        self.change_call_count.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request_xml.to_string());
        next(&self.change_responses, "change response")
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Configuration accepted by `Reconciler::new`
pub fn test_config() -> SyncConfig {
    SyncConfig::new(ProviderConfig::Custom {
        factory: "scripted".to_string(),
        config: serde_json::json!({}),
    })
}

/// One `<ResourceRecordSet>` with a TTL and plain values
pub fn rrset(name: &str, record_type: &str, ttl: u64, values: &[&str]) -> String {
    let records: String = values
        .iter()
        .map(|v| format!("<ResourceRecord><Value>{}</Value></ResourceRecord>", v))
        .collect();
    format!(
        "<ResourceRecordSet><Name>{}</Name><Type>{}</Type><TTL>{}</TTL>\
         <ResourceRecords>{}</ResourceRecords></ResourceRecordSet>",
        name, record_type, ttl, records
    )
}

/// A `<ResourceRecordSets>` document
pub fn record_sets_doc(rrsets: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ResourceRecordSets xmlns=\"{}\">\n{}\n</ResourceRecordSets>\n",
        NS,
        rrsets.join("\n")
    )
}

/// A `ListResourceRecordSetsResponse` page
///
/// `next` is `(name, type, identifier)`; a page with `next` is truncated.
pub fn record_page(rrsets: &[String], next: Option<(&str, &str, Option<&str>)>) -> String {
    let tail = match next {
        Some((name, record_type, identifier)) => format!(
            "<IsTruncated>true</IsTruncated><NextRecordName>{}</NextRecordName>\
             <NextRecordType>{}</NextRecordType>{}",
            name,
            record_type,
            identifier
                .map(|id| format!("<NextRecordIdentifier>{}</NextRecordIdentifier>", id))
                .unwrap_or_default()
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ListResourceRecordSetsResponse xmlns=\"{}\">\
         <ResourceRecordSets>{}</ResourceRecordSets>{}<MaxItems>100</MaxItems>\
         </ListResourceRecordSetsResponse>",
        NS,
        rrsets.concat(),
        tail
    )
}

/// A `ListHostedZonesResponse` page of `(id, name)` zones
pub fn zone_page(zones: &[(&str, &str)], next_marker: Option<&str>) -> String {
    let zones: String = zones
        .iter()
        .map(|(id, name)| {
            format!(
                "<HostedZone><Id>/hostedzone/{}</Id><Name>{}</Name>\
                 <CallerReference>ref</CallerReference>\
                 <Config><PrivateZone>false</PrivateZone></Config>\
                 <ResourceRecordSetCount>2</ResourceRecordSetCount></HostedZone>",
                id, name
            )
        })
        .collect();
    let tail = match next_marker {
        Some(marker) => format!(
            "<IsTruncated>true</IsTruncated><NextMarker>{}</NextMarker>",
            marker
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };
    format!(
        "<ListHostedZonesResponse xmlns=\"{}\"><HostedZones>{}</HostedZones>\
         <Marker/>{}<MaxItems>100</MaxItems></ListHostedZonesResponse>",
        NS, zones, tail
    )
}

/// A `ChangeResourceRecordSetsResponse`
pub fn change_response(id: &str) -> String {
    format!(
        "<ChangeResourceRecordSetsResponse xmlns=\"{}\"><ChangeInfo>\
         <Id>/change/{}</Id><Status>PENDING</Status>\
         <SubmittedAt>2024-01-01T00:00:00.000Z</SubmittedAt>\
         </ChangeInfo></ChangeResourceRecordSetsResponse>",
        NS, id
    )
}
