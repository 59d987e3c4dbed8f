//! Logging port for the bid pipeline.
//!
//! Components never talk to the global logger directly; they emit
//! `PipelineEvent`s into an injected `EventSink`. The binary wires `LogSink`
//! (forwarding to the `log` facade); tests use `MemorySink`.

use std::cell::RefCell;
use std::fmt;

use chrono::NaiveDate;

use crate::data::audit::FetchFailure;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Bid skipped without a fetch: bidder already known early, or no audit reference.
    SkippedCachedBid { bid: String },
    /// Bid skipped after its audit trail showed an early initial bid.
    SkippedFetchedBid { bid: String },
    /// Audit trail could not be fetched or read.
    AuditFetchFailed { bid: String, failure: FetchFailure },
    CurrencyConverted {
        tender: String,
        currency: String,
        date: NaiveDate,
        rate: f64,
        before: f64,
        after: f64,
    },
    /// Row suppressed because its value could not be normalized.
    ConversionFailed {
        tender: String,
        currency: String,
        reason: String,
    },
    BillComputed { tender: String, value: String, bill: f64 },
}

impl PipelineEvent {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            PipelineEvent::AuditFetchFailed { .. } | PipelineEvent::ConversionFailed { .. }
        )
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::SkippedCachedBid { bid } => write!(f, "Skipped cached early bid: {bid}"),
            PipelineEvent::SkippedFetchedBid { bid } => write!(f, "Skipped fetched early bid: {bid}"),
            PipelineEvent::AuditFetchFailed { bid, failure } => {
                write!(f, "Failed to read audit file of bid {bid}: {failure}")
            }
            PipelineEvent::CurrencyConverted {
                tender,
                currency,
                date,
                rate,
                before,
                after,
            } => write!(
                f,
                "Changing value by exchange rate {rate} on {date} for value {before} {currency} -> {after} in {tender}"
            ),
            PipelineEvent::ConversionFailed {
                tender,
                currency,
                reason,
            } => write!(f, "Skipped tender {tender}: cannot convert {currency}: {reason}"),
            PipelineEvent::BillComputed { tender, value, bill } => {
                write!(f, "Bill {bill} for tender {tender} with value {value}")
            }
        }
    }
}

pub trait EventSink {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to the process-wide `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: PipelineEvent) {
        if event.is_error() {
            log::error!("{event}");
        } else {
            log::info!("{event}");
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|&e| pred(e)).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: PipelineEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Sends every event to two sinks.
pub struct Tee<'a> {
    first: &'a dyn EventSink,
    second: &'a dyn EventSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn EventSink, second: &'a dyn EventSink) -> Self {
        Self { first, second }
    }
}

impl EventSink for Tee<'_> {
    fn emit(&self, event: PipelineEvent) {
        self.first.emit(event.clone());
        self.second.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit(PipelineEvent::SkippedCachedBid { bid: "a".to_string() });
        sink.emit(PipelineEvent::BillComputed {
            tender: "t".to_string(),
            value: "10".to_string(),
            bill: 7.0,
        });
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PipelineEvent::SkippedCachedBid { .. }));
        assert_eq!(sink.count(|e| matches!(e, PipelineEvent::BillComputed { .. })), 1);
    }

    #[test]
    fn tee_feeds_both_sinks() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let tee = Tee::new(&a, &b);
        tee.emit(PipelineEvent::SkippedFetchedBid { bid: "x".to_string() });
        assert_eq!(a.events(), b.events());
        assert_eq!(a.events().len(), 1);
    }

    #[test]
    fn failures_are_errors() {
        let ev = PipelineEvent::AuditFetchFailed {
            bid: "b".to_string(),
            failure: FetchFailure::Transport("timeout".to_string()),
        };
        assert!(ev.is_error());
        assert_eq!(ev.to_string(), "Failed to read audit file of bid b: request failed: timeout");
        assert!(!PipelineEvent::SkippedCachedBid { bid: "b".to_string() }.is_error());
    }
}
