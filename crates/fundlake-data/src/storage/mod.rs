//! Dataset files.
//!
//! | Format | Path |
//! |--------|------|
//! | CSV | `<datasets_dir>/<dataset>.csv` |
//! | JSONL | `<datasets_dir>/<dataset>/<YYYY_MM_DD>.jsonl` |
//! | Call log | `<datasets_dir>/<dataset>_api_call_timestamps_<YYYY-MM-DD>.csv` |
//!
//! Every write replaces the previous file at the same path.

pub mod call_log;
pub mod csv;
pub mod jsonl;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use fundlake_core::OutputFormat;

use crate::error::Result;
use crate::table::RecordTable;

pub use call_log::{calls_per_minute, peak_calls_per_minute};

/// Writes fetched tables under one datasets folder.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    datasets_dir: PathBuf,
    format: OutputFormat,
}

impl DatasetWriter {
    pub fn new(datasets_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            datasets_dir: datasets_dir.into(),
            format,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn datasets_dir(&self) -> &Path {
        &self.datasets_dir
    }

    /// Output path of `dataset` for `date`.
    pub fn dataset_path(&self, dataset: &str, date: NaiveDate) -> PathBuf {
        match self.format {
            OutputFormat::Csv => self.datasets_dir.join(format!("{}.csv", dataset)),
            OutputFormat::Jsonl => self
                .datasets_dir
                .join(dataset)
                .join(format!("{}.jsonl", date.format("%Y_%m_%d"))),
        }
    }

    /// Write `table` and return the file path.
    pub fn write(&self, dataset: &str, table: &RecordTable, date: NaiveDate) -> Result<PathBuf> {
        let path = self.dataset_path(dataset, date);
        ensure_parent(&path)?;

        match self.format {
            OutputFormat::Csv => csv::write_table(&path, table)?,
            OutputFormat::Jsonl => jsonl::write_table(&path, table)?,
        }

        info!(
            dataset,
            path = %path.display(),
            rows = table.len(),
            columns = table.column_count(),
            "Dataset saved"
        );
        Ok(path)
    }

    /// Write one row per API attempt.
    pub fn write_call_log(
        &self,
        dataset: &str,
        calls: &[DateTime<Utc>],
        date: NaiveDate,
    ) -> Result<PathBuf> {
        let path = self.datasets_dir.join(format!(
            "{}_api_call_timestamps_{}.csv",
            dataset,
            date.format("%Y-%m-%d")
        ));
        ensure_parent(&path)?;
        call_log::write_calls(&path, calls)?;

        info!(dataset, path = %path.display(), calls = calls.len(), "API call log saved");
        Ok(path)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> RecordTable {
        let mut table = RecordTable::new();
        let rows = vec![
            json!({"ticker": "AAPL", "year": 2023, "cash": 29.9}),
            json!({"ticker": "MSFT", "year": 2023, "note": "a,b"}),
        ];
        table.extend(rows.into_iter().filter_map(|v| match v {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }));
        table.lead_with(&["ticker", "year"]);
        table
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_csv_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path(), OutputFormat::Csv);

        let path = writer.write("financials_bs_annual", &table(), date()).unwrap();
        assert_eq!(path, dir.path().join("financials_bs_annual.csv"));

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ticker,year,cash,note");
        assert_eq!(lines[1], "AAPL,2023,29.9,");
        assert_eq!(lines[2], "MSFT,2023,,\"a,b\"");
    }

    #[test]
    fn test_jsonl_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path(), OutputFormat::Jsonl);

        let path = writer.write("profile2", &table(), date()).unwrap();
        assert_eq!(path, dir.path().join("profile2").join("2026_10_19.jsonl"));

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["note"], json!("a,b"));
    }

    #[test]
    fn test_call_log_path() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path(), OutputFormat::Csv);
        let calls = vec![Utc::now()];

        let path = writer.write_call_log("candle", &calls, date()).unwrap();
        assert_eq!(
            path,
            dir.path().join("candle_api_call_timestamps_2026-10-19.csv")
        );
        assert!(fs::read_to_string(path).unwrap().starts_with("timestamp\n"));
    }
}
