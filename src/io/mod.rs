//! Output helpers.
//!
//! - report CSV (`export`)

pub mod export;

pub use export::*;
