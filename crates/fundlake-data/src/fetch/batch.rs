//! Fan-out over all tickers of one endpoint.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::info;

use crate::error::FetchError;
use crate::fetch::normalize::TICKER_COLUMN;
use crate::fetch::ticker::{FetchJob, TickerOutcome, TickerReport};
use crate::table::RecordTable;

/// Combined result of one endpoint fetch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Dataset name (`endpoint` or `endpoint_sub`)
    pub dataset: String,
    /// Rows of every fetched ticker
    pub table: RecordTable,
    /// Tickers with at least one row
    pub fetched: Vec<String>,
    /// Tickers with no data
    pub empty: Vec<String>,
    /// Tickers whose attempts all failed
    pub exhausted: Vec<String>,
    /// Tickers whose response was unusable
    pub rejected: Vec<(String, FetchError)>,
    /// Start time of every attempt
    pub calls: Vec<DateTime<Utc>>,
}

impl BatchOutcome {
    fn from_reports(dataset: &str, primary_key: Option<&str>, reports: Vec<TickerReport>) -> Self {
        let mut outcome = BatchOutcome {
            dataset: dataset.to_string(),
            ..Default::default()
        };

        for report in reports {
            outcome.calls.extend(report.calls);
            match report.outcome {
                TickerOutcome::Fetched(rows) => {
                    outcome.table.extend(rows);
                    outcome.fetched.push(report.ticker);
                }
                TickerOutcome::Empty => outcome.empty.push(report.ticker),
                TickerOutcome::Exhausted { .. } => outcome.exhausted.push(report.ticker),
                TickerOutcome::Rejected { error } => outcome.rejected.push((report.ticker, error)),
            }
        }

        let mut leading = vec![TICKER_COLUMN];
        if let Some(key) = primary_key {
            leading.push(key);
        }
        outcome.table.lead_with(&leading);
        outcome.calls.sort();
        outcome
    }

    /// Tickers requested.
    pub fn total(&self) -> usize {
        self.fetched.len() + self.empty.len() + self.exhausted.len() + self.rejected.len()
    }

    /// Whether every ticker resolved to data or an explicit empty answer.
    pub fn is_complete(&self) -> bool {
        self.exhausted.is_empty() && self.rejected.is_empty()
    }
}

/// Fetch every ticker with at most `job.connections()` requests in flight.
///
/// All ticker futures are started at once and awaited together on the
/// current task; one ticker's failure never cancels the others.
pub async fn fetch_all(job: &FetchJob, tickers: &[String]) -> BatchOutcome {
    let limiter = Semaphore::new(job.connections());

    info!(
        dataset = job.dataset(),
        tickers = tickers.len(),
        connections = job.connections(),
        query_max = job.retry_policy().max_attempts,
        api_delay = ?job.retry_policy().delay,
        "Starting fetch"
    );

    let reports = join_all(tickers.iter().map(|t| job.fetch_ticker(&limiter, t))).await;
    let outcome = BatchOutcome::from_reports(job.dataset(), job.primary_key(), reports);

    info!(
        dataset = job.dataset(),
        fetched = outcome.fetched.len(),
        empty = outcome.empty.len(),
        exhausted = outcome.exhausted.len(),
        rejected = outcome.rejected.len(),
        rows = outcome.table.len(),
        "Fetch finished"
    );

    outcome
}
