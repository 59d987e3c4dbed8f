//! Domain types used throughout the report.
//!
//! This module defines:
//!
//! - run-level enums (`PaymentChannel`, `FeeBasis`)
//! - view records (`ViewRow`, `BidRecord`, `AuditRef`)
//! - audit timeline entries (`InitialBid`)
//! - report output (`OutputRow`, `OUTPUT_HEADER`)

pub mod types;

pub use types::*;
