//! Audit trail documents.
//!
//! An audit trail is a YAML document published next to a tender. The only part
//! consumed here is `timeline.auction_start.initial_bids`, a list of
//! `{bidder, date}` entries. Documents are untrusted: every failure mode is
//! folded into `AuditFetch::Failed` with a distinguishable reason.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_yaml::Value;

use crate::domain::{InitialBid, date_prefix};

/// Outcome of fetching and reading one audit trail.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditFetch {
    Timeline(Vec<InitialBid>),
    Failed(FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Network error or non-success HTTP status.
    Transport(String),
    /// Body is not parseable YAML.
    Scan(String),
    /// YAML parsed but the expected keys are missing or malformed.
    Schema(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Transport(msg) => write!(f, "request failed: {msg}"),
            FetchFailure::Scan(msg) => write!(f, "invalid YAML: {msg}"),
            FetchFailure::Schema(msg) => write!(f, "unexpected layout: {msg}"),
        }
    }
}

/// Source of audit trails, addressed by the reference stored on a bid.
pub trait AuditSource {
    fn fetch(&self, url: &str) -> AuditFetch;
}

/// Fetches audit trails over HTTP relative to the public API base URL.
/// Timelines that were read successfully are memoized by resolved URL for the
/// lifetime of the source; failures are retried on the next request.
pub struct HttpAuditSource {
    client: Client,
    base_url: String,
    memo: RefCell<HashMap<String, Vec<InitialBid>>>,
}

impl HttpAuditSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, url: &str) -> String {
        resolve_url(&self.base_url, url)
    }

    fn download(&self, full: &str) -> AuditFetch {
        let resp = match self.client.get(full).send() {
            Ok(resp) => resp,
            Err(e) => return AuditFetch::Failed(FetchFailure::Transport(e.to_string())),
        };
        if !resp.status().is_success() {
            return AuditFetch::Failed(FetchFailure::Transport(format!(
                "status {} for {full}",
                resp.status()
            )));
        }
        match resp.text() {
            Ok(body) => parse_audit_timeline(&body),
            Err(e) => AuditFetch::Failed(FetchFailure::Transport(e.to_string())),
        }
    }
}

impl AuditSource for HttpAuditSource {
    fn fetch(&self, url: &str) -> AuditFetch {
        let full = self.resolve(url);
        if let Some(timeline) = self.memo.borrow().get(&full) {
            return AuditFetch::Timeline(timeline.clone());
        }

        let fetched = self.download(&full);
        if let AuditFetch::Timeline(timeline) = &fetched {
            self.memo.borrow_mut().insert(full, timeline.clone());
        }
        fetched
    }
}

/// Join an audit reference onto the API base URL. Absolute references are
/// returned unchanged.
pub fn resolve_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
}

#[derive(Debug, Deserialize)]
struct RawInitialBid {
    bidder: String,
    date: String,
}

/// Read the initial-bids timeline out of an audit document body.
pub fn parse_audit_timeline(body: &str) -> AuditFetch {
    let doc: Value = match serde_yaml::from_str(body) {
        Ok(doc) => doc,
        Err(e) => return AuditFetch::Failed(FetchFailure::Scan(e.to_string())),
    };

    let Some(initial_bids) = doc
        .get("timeline")
        .and_then(|t| t.get("auction_start"))
        .and_then(|a| a.get("initial_bids"))
    else {
        return AuditFetch::Failed(FetchFailure::Schema(
            "missing timeline.auction_start.initial_bids".to_string(),
        ));
    };

    let raw: Vec<RawInitialBid> = match serde_yaml::from_value(initial_bids.clone()) {
        Ok(raw) => raw,
        Err(e) => return AuditFetch::Failed(FetchFailure::Schema(e.to_string())),
    };

    let mut timeline = Vec::with_capacity(raw.len());
    for entry in raw {
        let Some(date) = date_prefix(&entry.date) else {
            return AuditFetch::Failed(FetchFailure::Schema(format!(
                "invalid initial bid date '{}'",
                entry.date
            )));
        };
        timeline.push(InitialBid {
            bidder: entry.bidder,
            date,
        });
    }
    AuditFetch::Timeline(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::stub_server::{self, StubServer};
    use chrono::NaiveDate;

    const AUDIT: &str = r#"
id: 1f2e
tender_id: UA-2016-03-01-000001
timeline:
  auction_start:
    time: '2016-04-02T10:00:00+03:00'
    initial_bids:
      - bidder: aaa
        date: '2016-03-28T09:00:00.000000+03:00'
        amount: 1000
      - bidder: bbb
        date: '2016-04-01T00:00:01+03:00'
"#;

    #[test]
    fn reads_initial_bids() {
        let AuditFetch::Timeline(bids) = parse_audit_timeline(AUDIT) else {
            panic!("expected timeline");
        };
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].bidder, "aaa");
        assert_eq!(bids[0].date, NaiveDate::from_ymd_opt(2016, 3, 28).unwrap());
        assert_eq!(bids[1].date, NaiveDate::from_ymd_opt(2016, 4, 1).unwrap());
    }

    #[test]
    fn unparseable_body_is_a_scan_failure() {
        let out = parse_audit_timeline("timeline: [unclosed");
        assert!(matches!(out, AuditFetch::Failed(FetchFailure::Scan(_))));
    }

    #[test]
    fn missing_keys_are_schema_failures() {
        let out = parse_audit_timeline("timeline:\n  auction_start: {}\n");
        assert!(matches!(out, AuditFetch::Failed(FetchFailure::Schema(_))));

        let out = parse_audit_timeline("timeline:\n  auction_start:\n    initial_bids:\n      - date: '2016-01-01'\n");
        assert!(matches!(out, AuditFetch::Failed(FetchFailure::Schema(_))));

        let out = parse_audit_timeline("timeline:\n  auction_start:\n    initial_bids:\n      - bidder: x\n        date: soon\n");
        assert!(matches!(out, AuditFetch::Failed(FetchFailure::Schema(_))));
    }

    #[test]
    fn scalar_document_is_a_schema_failure() {
        let out = parse_audit_timeline("just a string");
        assert!(matches!(out, AuditFetch::Failed(FetchFailure::Schema(_))));
    }

    #[test]
    fn resolve_joins_relative_and_keeps_absolute() {
        assert_eq!(resolve_url("http://api/", "/audits/1.yaml"), "http://api/audits/1.yaml");
        assert_eq!(resolve_url("http://api", "audits/1.yaml"), "http://api/audits/1.yaml");
        assert_eq!(resolve_url("http://api", "https://cdn/a.yaml"), "https://cdn/a.yaml");
    }

    #[test]
    fn repeated_url_is_downloaded_once() {
        let server = StubServer::start(vec![(200, AUDIT.to_string())]);
        let source = HttpAuditSource::new(stub_server::client(), server.base_url.clone());

        for _ in 0..3 {
            let AuditFetch::Timeline(bids) = source.fetch("/audits/t1.yaml") else {
                panic!("expected timeline");
            };
            assert_eq!(bids.len(), 2);
        }
        // Same document under its absolute address.
        let absolute = format!("{}/audits/t1.yaml", server.base_url);
        assert!(matches!(source.fetch(&absolute), AuditFetch::Timeline(_)));

        assert_eq!(server.hits(), 1);
        assert!(server.requests()[0].starts_with("GET /audits/t1.yaml "));
    }

    #[test]
    fn failed_download_is_not_remembered() {
        let server = StubServer::start(vec![(500, String::new()), (200, AUDIT.to_string())]);
        let source = HttpAuditSource::new(stub_server::client(), server.base_url.clone());

        assert!(matches!(
            source.fetch("audits/t2.yaml"),
            AuditFetch::Failed(FetchFailure::Transport(_))
        ));
        assert!(matches!(source.fetch("audits/t2.yaml"), AuditFetch::Timeline(_)));
        assert!(matches!(source.fetch("audits/t2.yaml"), AuditFetch::Timeline(_)));
        assert_eq!(server.hits(), 2);
    }
}
