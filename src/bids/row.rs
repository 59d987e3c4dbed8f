//! Per-record row assembly.
//!
//! A record is either suppressed (early bid, or a value that cannot be put in
//! the reference currency) or turned into a complete `OutputRow`. Rows are
//! never emitted half-built.

use chrono::NaiveDate;

use crate::bids::currency::CurrencyNormalizer;
use crate::bids::events::{EventSink, PipelineEvent};
use crate::bids::fees::FeeSchedule;
use crate::bids::filter::EarlyBidFilter;
use crate::domain::{BidRecord, OutputRow, PaymentChannel, ViewRow};

/// Why a record produced no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    EarlyBid,
    Conversion,
}

pub struct RowBuilder<'a> {
    filter: EarlyBidFilter<'a>,
    normalizer: CurrencyNormalizer<'a>,
    schedule: &'a FeeSchedule,
    channel: PaymentChannel,
    events: &'a dyn EventSink,
}

impl<'a> RowBuilder<'a> {
    pub fn new(
        filter: EarlyBidFilter<'a>,
        normalizer: CurrencyNormalizer<'a>,
        schedule: &'a FeeSchedule,
        channel: PaymentChannel,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            filter,
            normalizer,
            schedule,
            channel,
            events,
        }
    }

    pub fn filter(&self) -> &EarlyBidFilter<'a> {
        &self.filter
    }

    pub fn into_filter(self) -> EarlyBidFilter<'a> {
        self.filter
    }

    /// Build the row for one view row, or `None` when it is suppressed.
    pub fn build_row(&mut self, row: &ViewRow) -> Option<OutputRow> {
        self.try_build(row.rate_date(), &row.record).ok()
    }

    /// Same as `build_row`, but reports why a record was suppressed.
    pub fn try_build(&mut self, rate_date: Option<NaiveDate>, record: &BidRecord) -> Result<OutputRow, Suppression> {
        let bid_id = record.bid_id();
        // A missing start date compares as earlier than any cutoff.
        let started_early = record
            .tender_start()
            .is_none_or(|start| start < self.filter.cutoff());
        if started_early && !self.filter.is_eligible(bid_id, record.audits.as_ref()) {
            return Err(Suppression::EarlyBid);
        }

        let tender = record.tender.clone().unwrap_or_default();
        let currency = record.currency_code();
        let mut value = record.amount();

        if !self.normalizer.is_reference(currency) {
            let Some(date) = rate_date else {
                self.events.emit(PipelineEvent::ConversionFailed {
                    tender,
                    currency: currency.to_string(),
                    reason: "record key has no date".to_string(),
                });
                return Err(Suppression::Conversion);
            };
            match self.normalizer.normalize(value, currency, date, &tender) {
                Ok((normalized, _rate)) => value = normalized,
                Err(e) => {
                    self.events.emit(PipelineEvent::ConversionFailed {
                        tender,
                        currency: currency.to_string(),
                        reason: e.to_string(),
                    });
                    return Err(Suppression::Conversion);
                }
            }
        }

        let out = OutputRow {
            tender,
            tender_id: record.tender_id.clone().unwrap_or_default(),
            lot: record.lot.clone().unwrap_or_default(),
            value: record.value_text(),
            currency: currency.to_string(),
            bid: bid_id.to_string(),
            bill: self.schedule.compute_fee(value, self.channel),
        };
        self.events.emit(PipelineEvent::BillComputed {
            tender: out.tender.clone(),
            value: out.value.clone(),
            bill: out.bill,
        });
        Ok(out)
    }
}
