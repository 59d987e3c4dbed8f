//! Process-wide log sink.
//!
//! Lines look like `2016-05-12 10:00:00 -- INFO - message`. The default level
//! is `info`; `RUST_LOG` overrides it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::error::AppError;

/// Install the global logger, writing to `log_file` (appended) or stderr.
///
/// Calling this twice is harmless; the first logger stays installed.
pub fn init(log_file: Option<&Path>) -> Result<(), AppError> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} -- {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        });

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::io(format!("Failed to open log file '{}': {e}", path.display())))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init().ok();
    Ok(())
}
