//! Phase timing report
//!
//! Written as `metric,seconds,count` with one line per phase.

use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Column names of the report header
pub const REPORT_HEADER: [&str; 3] = ["metric", "seconds", "count"];

/// Timing of one load phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseMetric {
    pub label: String,
    pub seconds: f64,
    pub count: Option<u64>,
}

/// Timings of a whole load run, in phase order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    phases: Vec<PhaseMetric>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phase
    pub fn record(&mut self, label: impl Into<String>, elapsed: Duration, count: Option<u64>) {
        self.phases.push(PhaseMetric {
            label: label.into(),
            seconds: elapsed.as_secs_f64(),
            count,
        });
    }

    pub fn phases(&self) -> &[PhaseMetric] {
        &self.phases
    }

    /// Look up a phase by label
    pub fn phase(&self, label: &str) -> Option<&PhaseMetric> {
        self.phases.iter().find(|p| p.label == label)
    }

    /// Write the report as CSV: header, then one line per phase
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);

        writer.write_record(REPORT_HEADER)?;
        for phase in &self.phases {
            writer.serialize(phase)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the report to a file, replacing it
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            Error::Other(format!("Failed to create report {}: {}", path.display(), e))
        })?;
        self.write_to(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_phase_with_trailing_newline() {
        let mut report = LoadReport::new();
        report.record("bulk_create_genes", Duration::from_millis(1500), Some(3));
        report.record("bulk_create_sims", Duration::from_millis(250), Some(9));

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "metric,seconds,count\nbulk_create_genes,1.5,3\nbulk_create_sims,0.25,9\n"
        );
    }

    #[test]
    fn test_missing_count_is_empty_field() {
        let mut report = LoadReport::new();
        report.record("write", Duration::from_secs(2), None);

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("write,2.0,\n"));
    }

    #[test]
    fn test_empty_report_still_has_header() {
        let mut out = Vec::new();
        LoadReport::new().write_to(&mut out).unwrap();
        assert_eq!(out, b"metric,seconds,count\n");
    }

    #[test]
    fn test_phase_lookup() {
        let mut report = LoadReport::new();
        report.record("a", Duration::ZERO, Some(1));
        assert_eq!(report.phase("a").unwrap().count, Some(1));
        assert!(report.phase("b").is_none());
    }

    #[test]
    fn test_write_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let mut report = LoadReport::new();
        report.record("baseline_genes_create", Duration::from_secs(1), Some(2));
        report.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
