//! Remote data sources: the bids view, audit trails and exchange rates.

pub mod audit;
pub mod rates;
pub mod view;

#[cfg(test)]
pub(crate) mod stub_server;

pub use audit::{AuditFetch, AuditSource, FetchFailure, HttpAuditSource};
pub use rates::{InMemoryRates, NbuRates, RateSource};
pub use view::{ViewClient, ViewPager};
