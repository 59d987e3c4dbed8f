//! Early-bid eligibility.
//!
//! A bid placed before the cutoff date is not billable. The only evidence of
//! when a bidder first bid is the tender's audit trail, which is expensive to
//! fetch, so bidders found to be early are remembered in an `EarlyBidderSet`
//! for the rest of the run.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::bids::events::{EventSink, PipelineEvent};
use crate::data::audit::{AuditFetch, AuditSource};
use crate::domain::AuditRef;

/// Bidders known to have bid before the cutoff. Append-only for one run.
#[derive(Debug, Clone, Default)]
pub struct EarlyBidderSet {
    bidders: HashSet<String>,
}

impl EarlyBidderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bidder: &str) -> bool {
        self.bidders.contains(bidder)
    }

    /// Returns `true` if the bidder was not yet known.
    pub fn insert(&mut self, bidder: impl Into<String>) -> bool {
        self.bidders.insert(bidder.into())
    }

    pub fn len(&self) -> usize {
        self.bidders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bidders.is_empty()
    }
}

pub struct EarlyBidFilter<'a> {
    cutoff: NaiveDate,
    early: EarlyBidderSet,
    audits: &'a dyn AuditSource,
    events: &'a dyn EventSink,
}

impl<'a> EarlyBidFilter<'a> {
    pub fn new(
        cutoff: NaiveDate,
        early: EarlyBidderSet,
        audits: &'a dyn AuditSource,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            cutoff,
            early,
            audits,
            events,
        }
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    pub fn early_bidders(&self) -> &EarlyBidderSet {
        &self.early
    }

    pub fn into_early_bidders(self) -> EarlyBidderSet {
        self.early
    }

    /// Decide whether `bid_id` may be billed.
    ///
    /// Known early bidders and bids without an audit reference are rejected
    /// without a fetch. Otherwise the audit trail is read and every bidder with
    /// an initial bid strictly before the cutoff is remembered. A failed fetch
    /// discovers nobody.
    pub fn is_eligible(&mut self, bid_id: &str, audit: Option<&AuditRef>) -> bool {
        let audit = match audit {
            Some(audit) if !self.early.contains(bid_id) && !audit.url.is_empty() => audit,
            _ => {
                self.events.emit(PipelineEvent::SkippedCachedBid {
                    bid: bid_id.to_string(),
                });
                return false;
            }
        };

        match self.audits.fetch(&audit.url) {
            AuditFetch::Timeline(initial_bids) => {
                for entry in initial_bids {
                    if entry.date < self.cutoff {
                        self.early.insert(entry.bidder);
                    }
                }
            }
            AuditFetch::Failed(failure) => {
                self.events.emit(PipelineEvent::AuditFetchFailed {
                    bid: bid_id.to_string(),
                    failure,
                });
            }
        }

        if self.early.contains(bid_id) {
            self.events.emit(PipelineEvent::SkippedFetchedBid {
                bid: bid_id.to_string(),
            });
            return false;
        }
        true
    }
}
