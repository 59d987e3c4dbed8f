//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads configuration and installs the logger
//! - runs the report pipeline
//! - writes the CSV and prints the summary

use clap::Parser;

use crate::cli::{Command, FeeArgs, ReportArgs};
use crate::config::{ReportConfig, load_fee_schedule};
use crate::error::AppError;

pub mod pipeline;

use pipeline::ReportRequest;

/// Entry point for the `bids` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Fee(args) => handle_fee(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    if args.start > args.end {
        return Err(AppError::config(format!(
            "Period start {} is after period end {}.",
            args.start, args.end
        )));
    }

    let mut config = ReportConfig::load(&args.config)?;
    if let Some(dir) = &args.out_dir {
        config.out_dir = dir.clone();
    }
    crate::logging::init(config.log_file.as_deref())?;

    let request = ReportRequest {
        owner: args.broker.clone(),
        start: args.start,
        end: args.end,
        channel: args.channel,
    };
    let run = pipeline::run_report(&config, &request)?;

    let path = crate::io::report_path(&config.out_dir, &request.owner, &request.start_key(), &request.end_key());
    crate::io::write_rows_csv(&path, &run.rows)?;
    log::info!("Wrote {} rows to {}", run.rows.len(), path.display());

    println!("{}", crate::report::format_run_summary(&run.summary, &request, &path));
    Ok(())
}

fn handle_fee(args: FeeArgs) -> Result<(), AppError> {
    if !args.value.is_finite() {
        return Err(AppError::config(format!("Invalid value {}.", args.value)));
    }
    let schedule = load_fee_schedule(&args.config)?;
    println!("{}", crate::report::format_fee_quote(&schedule, args.value, args.channel));
    Ok(())
}
