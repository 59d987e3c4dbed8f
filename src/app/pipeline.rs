//! The report pipeline shared by the CLI front-end and tests.
//!
//! view pages -> `RowBuilder` per record -> rows + run summary
//!
//! Records are processed strictly one at a time; an audit fetch for one record
//! finishes before the next record is read.

use std::cell::Cell;

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::bids::{
    CurrencyNormalizer, EarlyBidFilter, EarlyBidderSet, EventSink, LogSink, PipelineEvent, RowBuilder, Suppression,
    Tee,
};
use crate::config::ReportConfig;
use crate::data::{AuditSource, HttpAuditSource, NbuRates, RateSource, ViewClient};
use crate::domain::{OutputRow, PaymentChannel, ViewRow};
use crate::error::AppError;

/// What to report on.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub owner: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub channel: PaymentChannel,
}

impl ReportRequest {
    pub fn start_key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_key(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records_read: usize,
    pub rows_emitted: usize,
    pub suppressed_early: usize,
    pub suppressed_conversion: usize,
    pub audit_failures: usize,
    pub conversions: usize,
    pub early_bidders: usize,
    pub total_bill: f64,
}

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: Vec<OutputRow>,
    pub summary: RunSummary,
}

/// Counts the events the summary cares about.
#[derive(Debug, Default)]
struct Tally {
    audit_failures: Cell<usize>,
    conversions: Cell<usize>,
}

impl EventSink for Tally {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::AuditFetchFailed { .. } => self.audit_failures.set(self.audit_failures.get() + 1),
            PipelineEvent::CurrencyConverted { .. } => self.conversions.set(self.conversions.get() + 1),
            _ => {}
        }
    }
}

/// Run the report against the configured remote sources.
pub fn run_report(config: &ReportConfig, request: &ReportRequest) -> Result<RunOutput, AppError> {
    let client = Client::new();
    let view = ViewClient::new(client.clone(), config.db.url(), config.db.page_size);
    let audits = HttpAuditSource::new(client.clone(), config.api_url.clone());
    let rates = NbuRates::new(client, config.rates_url.clone());

    log::info!(
        "Building bids report for {} from {} to {} ({} channel)",
        request.owner,
        request.start,
        request.end,
        request.channel.display_name()
    );

    let rows = view.rows(&request.owner, &request.start_key(), &request.end_key());
    build_rows(rows, config, request.channel, &audits, &rates, &LogSink)
}

/// Build rows from an already-opened record stream.
///
/// A failing record source aborts the run; everything that goes wrong with a
/// single record only affects that record.
pub fn build_rows<I>(
    records: I,
    config: &ReportConfig,
    channel: PaymentChannel,
    audits: &dyn AuditSource,
    rates: &dyn RateSource,
    events: &dyn EventSink,
) -> Result<RunOutput, AppError>
where
    I: IntoIterator<Item = Result<ViewRow, AppError>>,
{
    let tally = Tally::default();
    let sink = Tee::new(events, &tally);

    let filter = EarlyBidFilter::new(config.cutoff, EarlyBidderSet::new(), audits, &sink);
    let normalizer = CurrencyNormalizer::new(config.reference_currency.clone(), rates, &sink);
    let mut builder = RowBuilder::new(filter, normalizer, &config.schedule, channel, &sink);

    let mut rows = Vec::new();
    let mut summary = RunSummary::default();

    for record in records {
        let record = record?;
        summary.records_read += 1;
        match builder.try_build(record.rate_date(), &record.record) {
            Ok(row) => {
                summary.total_bill += row.bill;
                rows.push(row);
            }
            Err(Suppression::EarlyBid) => summary.suppressed_early += 1,
            Err(Suppression::Conversion) => summary.suppressed_conversion += 1,
        }
    }

    summary.rows_emitted = rows.len();
    summary.early_bidders = builder.into_filter().early_bidders().len();
    summary.audit_failures = tally.audit_failures.get();
    summary.conversions = tally.conversions.get();

    Ok(RunOutput { rows, summary })
}
