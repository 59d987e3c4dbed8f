//! Terminal reporting: run summaries and fee quotes.

pub mod format;

pub use format::{format_fee_quote, format_run_summary};
