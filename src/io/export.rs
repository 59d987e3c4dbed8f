//! Write report rows to CSV.
//!
//! The file is meant to be easy to consume in spreadsheets or downstream
//! billing scripts: one header line, one line per billed bid.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use crate::domain::{OUTPUT_HEADER, OutputRow};
use crate::error::AppError;

/// `{owner}@{start}--{end}-bids.csv` inside `out_dir`.
pub fn report_path(out_dir: &Path, owner: &str, start: &str, end: &str) -> PathBuf {
    out_dir.join(format!("{owner}@{start}--{end}-bids.csv"))
}

/// Write the rows (with header) to `path`, creating parent directories.
pub fn write_rows_csv(path: &Path, rows: &[OutputRow]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create output dir '{}': {e}", parent.display())))?;
    }

    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create report CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(OUTPUT_HEADER)
        .map_err(|e| AppError::io(format!("Failed to write report CSV header: {e}")))?;

    for row in rows {
        writer
            .write_record(row.to_record())
            .map_err(|e| AppError::io(format!("Failed to write report CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush report CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = report_path(&dir.path().join("nested"), "broker", "2016-05-01", "2016-06-01");
        assert!(path.ends_with("broker@2016-05-01--2016-06-01-bids.csv"));

        let rows = vec![OutputRow {
            tender: "t1".to_string(),
            tender_id: "UA-1".to_string(),
            lot: String::new(),
            value: "1000".to_string(),
            currency: "UAH".to_string(),
            bid: "b, quoted".to_string(),
            bill: 7.0,
        }];
        write_rows_csv(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(header, OUTPUT_HEADER);
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][5], "b, quoted");
        assert_eq!(&records[0][6], "7");
    }
}
