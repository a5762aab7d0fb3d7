//! Collection statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fundlake_data::storage::peak_calls_per_minute;
use fundlake_data::BatchOutcome;

/// Counters for one or more endpoint fetches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Ticker fetches attempted
    pub total: usize,
    /// Tickers with rows
    pub success: usize,
    /// Tickers with no data
    pub empty: usize,
    /// Tickers dropped after every attempt failed
    pub exhausted: usize,
    /// Tickers with unusable responses
    pub rejected: usize,
    /// Endpoints that failed outright
    pub errors: usize,
    /// Rows written
    pub rows: usize,
    /// HTTP attempts made
    pub api_calls: usize,
    /// Busiest minute's attempt count
    pub peak_calls_per_minute: usize,
    /// Wall time
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_batch(outcome: &BatchOutcome, elapsed: Duration) -> Self {
        Self {
            total: outcome.total(),
            success: outcome.fetched.len(),
            empty: outcome.empty.len(),
            exhausted: outcome.exhausted.len(),
            rejected: outcome.rejected.len(),
            errors: 0,
            rows: outcome.table.len(),
            api_calls: outcome.calls.len(),
            peak_calls_per_minute: peak_calls_per_minute(&outcome.calls),
            elapsed,
        }
    }

    /// Add `other`'s counters. The peak keeps the larger value.
    pub fn merge(&mut self, other: &CollectionStats) {
        self.total += other.total;
        self.success += other.success;
        self.empty += other.empty;
        self.exhausted += other.exhausted;
        self.rejected += other.rejected;
        self.errors += other.errors;
        self.rows += other.rows;
        self.api_calls += other.api_calls;
        self.peak_calls_per_minute = self.peak_calls_per_minute.max(other.peak_calls_per_minute);
        self.elapsed += other.elapsed;
    }

    /// Share of tickers with rows (%).
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            empty = self.empty,
            exhausted = self.exhausted,
            rejected = self.rejected,
            errors = self.errors,
            rows = self.rows,
            api_calls = self.api_calls,
            peak_calls_per_minute = self.peak_calls_per_minute,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "Collection finished"
        );
    }
}
