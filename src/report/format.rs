//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation and output changes are localized.

use std::path::Path;

use crate::app::pipeline::{ReportRequest, RunSummary};
use crate::bids::FeeSchedule;
use crate::domain::{FeeBasis, PaymentChannel};

/// Format the end-of-run summary.
pub fn format_run_summary(summary: &RunSummary, request: &ReportRequest, output: &Path) -> String {
    let mut out = String::new();

    out.push_str("=== bids - billing report ===\n");
    out.push_str(&format!("Broker: {}\n", request.owner));
    out.push_str(&format!("Period: {} .. {}\n", request.start, request.end));
    out.push_str(&format!("Channel: {}\n", request.channel.display_name()));
    out.push('\n');
    out.push_str(&format!("Records read:        {}\n", summary.records_read));
    out.push_str(&format!("Rows emitted:        {}\n", summary.rows_emitted));
    out.push_str(&format!(
        "Suppressed:          {} (early bids: {}, conversion failures: {})\n",
        summary.suppressed_early + summary.suppressed_conversion,
        summary.suppressed_early,
        summary.suppressed_conversion
    ));
    out.push_str(&format!("Early bidders found: {}\n", summary.early_bidders));
    out.push_str(&format!("Audit fetch errors:  {}\n", summary.audit_failures));
    out.push_str(&format!("Currency conversions: {}\n", summary.conversions));
    out.push_str(&format!("Total bill:          {:.2}\n", summary.total_bill));
    out.push_str(&format!("Output: {}\n", output.display()));

    out
}

/// Format a single fee lookup, showing which bucket matched.
pub fn format_fee_quote(schedule: &FeeSchedule, value: f64, channel: PaymentChannel) -> String {
    let bucket = schedule.bucket(value);
    let thresholds = schedule.thresholds();
    let range = match (bucket.checked_sub(1).map(|i| thresholds[i]), thresholds.get(bucket)) {
        (None, Some(hi)) => format!("<= {hi}"),
        (Some(lo), Some(hi)) => format!("({lo}, {hi}]"),
        (Some(lo), None) => format!("> {lo}"),
        (None, None) => "any value".to_string(),
    };
    let basis = match schedule.basis() {
        FeeBasis::Flat => "flat",
        FeeBasis::Proportional => "proportional",
    };

    let mut out = String::new();
    out.push_str(&format!("Value:   {value}\n"));
    out.push_str(&format!("Channel: {}\n", channel.display_name()));
    out.push_str(&format!("Bucket:  {bucket} {range}\n"));
    out.push_str(&format!(
        "Rate:    {} ({basis})\n",
        schedule.rate_for(value, channel)
    ));
    out.push_str(&format!("Fee:     {}\n", schedule.compute_fee(value, channel)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn schedule() -> FeeSchedule {
        FeeSchedule::new(
            vec![20_000.0, 50_000.0],
            vec![7.0, 50.0, 150.0],
            vec![5.0, 20.0, 50.0],
            FeeBasis::Flat,
        )
        .unwrap()
    }

    #[test]
    fn fee_quote_names_bucket_range() {
        let s = schedule();
        let low = format_fee_quote(&s, 100.0, PaymentChannel::Primary);
        assert!(low.contains("Bucket:  0 <= 20000"));
        assert!(low.contains("Fee:     7"));

        let mid = format_fee_quote(&s, 20_000.5, PaymentChannel::Secondary);
        assert!(mid.contains("Bucket:  1 (20000, 50000]"));
        assert!(mid.contains("Fee:     20"));

        let high = format_fee_quote(&s, 1e6, PaymentChannel::Primary);
        assert!(high.contains("Bucket:  2 > 50000"));
        assert!(high.contains("Rate:    150 (flat)"));
    }

    #[test]
    fn summary_lists_counters() {
        let request = ReportRequest {
            owner: "broker".to_string(),
            start: NaiveDate::from_ymd_opt(2016, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2016, 6, 1).unwrap(),
            channel: PaymentChannel::Secondary,
        };
        let summary = RunSummary {
            records_read: 10,
            rows_emitted: 7,
            suppressed_early: 2,
            suppressed_conversion: 1,
            audit_failures: 0,
            conversions: 3,
            early_bidders: 4,
            total_bill: 123.0,
        };
        let text = format_run_summary(&summary, &request, &PathBuf::from("out/x.csv"));
        assert!(text.contains("Broker: broker"));
        assert!(text.contains("Channel: secondary"));
        assert!(text.contains("Suppressed:          3 (early bids: 2, conversion failures: 1)"));
        assert!(text.contains("Total bill:          123.00"));
        assert!(text.contains("Output: out/x.csv"));
    }
}
