//! `bid-reports` library crate.
//!
//! The binary (`bids`) is a thin wrapper around this library so that:
//!
//! - the eligibility/fee pipeline is testable without network access
//! - remote collaborators (view, audit trails, exchange rates) sit behind traits
//! - code stays easy to navigate as new reports are added

pub mod app;
pub mod bids;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
