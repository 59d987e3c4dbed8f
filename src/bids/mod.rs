//! Bid eligibility and fee computation.
//!
//! `RowBuilder` drives the per-record flow:
//! eligibility (`filter`) -> currency normalization (`currency`) -> fee (`fees`).
//! All diagnostics go through the `events` port.

pub mod currency;
pub mod events;
pub mod fees;
pub mod filter;
pub mod row;

pub use currency::CurrencyNormalizer;
pub use events::{EventSink, LogSink, MemorySink, PipelineEvent, Tee};
pub use fees::FeeSchedule;
pub use filter::{EarlyBidFilter, EarlyBidderSet};
pub use row::{RowBuilder, Suppression};
