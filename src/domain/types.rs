//! Shared domain types.
//!
//! Records arrive from a remote view and are treated as partially populated:
//! every field is optional and malformed shapes degrade to "missing" instead of
//! failing the whole page.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Which rate table of the fee schedule applies to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChannel {
    /// Bids placed through the central database (`payments.primary`).
    Primary,
    /// Bids placed through a partner marketplace (`payments.secondary`).
    Secondary,
}

impl PaymentChannel {
    pub fn display_name(self) -> &'static str {
        match self {
            PaymentChannel::Primary => "primary",
            PaymentChannel::Secondary => "secondary",
        }
    }
}

/// How a bucket's rate turns into a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeBasis {
    /// The bucket rate is the fee.
    #[default]
    Flat,
    /// The fee is the bucket rate multiplied by the value.
    Proportional,
}

/// Pointer to the audit trail document of a bid's tender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRef {
    pub url: String,
}

/// A bid as stored in the `bids_owner_date` view.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BidRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub tender: Option<String>,
    #[serde(default, rename = "tenderID", deserialize_with = "lenient_text")]
    pub tender_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub lot: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tender_start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_audit")]
    pub audits: Option<AuditRef>,
}

impl BidRecord {
    /// Build a record from an arbitrary JSON value; anything that is not an
    /// object yields an empty record.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn bid_id(&self) -> &str {
        self.bid.as_deref().unwrap_or("")
    }

    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or("")
    }

    /// Tender start date (date part only), if present and well-formed.
    pub fn tender_start(&self) -> Option<NaiveDate> {
        self.tender_start_date.as_deref().and_then(date_prefix)
    }

    /// Numeric amount used for conversion and fees. Missing or unparsable
    /// values count as zero.
    pub fn amount(&self) -> f64 {
        let parsed = match &self.value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// The value column exactly as received.
    pub fn value_text(&self) -> String {
        match &self.value {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// One `{id, key, value}` row of the view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub id: String,
    pub key: Value,
    pub record: BidRecord,
}

impl ViewRow {
    /// Exchange-rate date for the row: the date part of the second key element
    /// (`[owner, date]`).
    pub fn rate_date(&self) -> Option<NaiveDate> {
        self.key.get(1).and_then(Value::as_str).and_then(date_prefix)
    }
}

/// An entry of an audit trail's initial-bids timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialBid {
    pub bidder: String,
    pub date: NaiveDate,
}

/// Column names of the emitted report, in order.
pub const OUTPUT_HEADER: [&str; 7] = ["tender", "tenderID", "lot", "value", "currency", "bid", "bill"];

/// A fully built report row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub tender: String,
    pub tender_id: String,
    pub lot: String,
    pub value: String,
    pub currency: String,
    pub bid: String,
    pub bill: f64,
}

impl OutputRow {
    /// Cells in `OUTPUT_HEADER` order.
    pub fn to_record(&self) -> [String; 7] {
        [
            self.tender.clone(),
            self.tender_id.clone(),
            self.lot.clone(),
            self.value.clone(),
            self.currency.clone(),
            self.bid.clone(),
            self.bill.to_string(),
        ]
    }
}

/// Parse the `YYYY-MM-DD` prefix of an ISO-8601 date or timestamp.
pub fn date_prefix(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }))
}

fn lenient_audit<'de, D>(deserializer: D) -> Result<Option<AuditRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(audit_ref_from))
}

fn audit_ref_from(value: &Value) -> Option<AuditRef> {
    let url = match value {
        Value::Object(map) => map.get("url").and_then(Value::as_str)?,
        Value::String(s) => s.as_str(),
        Value::Array(items) => return items.iter().find_map(audit_ref_from),
        _ => return None,
    };
    let url = url.trim();
    if url.is_empty() {
        None
    } else {
        Some(AuditRef { url: url.to_string() })
    }
}
