//! Command-line parsing for the bids billing report.
//!
//! Argument parsing is kept separate from the pipeline so the pipeline can be
//! driven from tests without spawning processes.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::PaymentChannel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bids", version, about = "Bid billing report (early-bid filtered, tiered fees)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the bids report for a broker and period and write it as CSV.
    Report(ReportArgs),
    /// Show the fee the configured schedule yields for a value.
    Fee(FeeArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Configuration file (TOML).
    #[arg(short = 'c', long, default_value = "reports.toml")]
    pub config: PathBuf,

    /// Broker (view owner) to report on.
    #[arg(short = 'b', long)]
    pub broker: String,

    /// First day of the period (YYYY-MM-DD).
    #[arg(long, value_parser = parse_day)]
    pub start: NaiveDate,

    /// Last day of the period, included in full (YYYY-MM-DD).
    #[arg(long, value_parser = parse_day)]
    pub end: NaiveDate,

    /// Which payment table to bill with.
    #[arg(long, value_enum, default_value_t = PaymentChannel::Primary)]
    pub channel: PaymentChannel,

    /// Write the CSV here instead of `out.out_dir`.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FeeArgs {
    /// Configuration file (TOML); only `[payments]` is read.
    #[arg(short = 'c', long, default_value = "reports.toml")]
    pub config: PathBuf,

    /// Value in the reference currency.
    #[arg(long, allow_negative_numbers = true)]
    pub value: f64,

    /// Which payment table to use.
    #[arg(long, value_enum, default_value_t = PaymentChannel::Primary)]
    pub channel: PaymentChannel,
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{raw}' (expected YYYY-MM-DD): {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_command() {
        let cli = Cli::parse_from([
            "bids", "report", "-b", "broker1", "--start", "2016-05-01", "--end", "2016-06-01", "--channel",
            "secondary",
        ]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.broker, "broker1");
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2016, 5, 1).unwrap());
        assert_eq!(args.channel, PaymentChannel::Secondary);
        assert_eq!(args.config, PathBuf::from("reports.toml"));
        assert!(args.out_dir.is_none());
    }

    #[test]
    fn rejects_bad_dates() {
        let res = Cli::try_parse_from(["bids", "report", "-b", "x", "--start", "01/05/2016", "--end", "2016-06-01"]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_fee_command() {
        let cli = Cli::parse_from(["bids", "fee", "--value", "25000"]);
        let Command::Fee(args) = cli.command else {
            panic!("expected fee");
        };
        assert_eq!(args.value, 25000.0);
        assert_eq!(args.channel, PaymentChannel::Primary);
    }
}
