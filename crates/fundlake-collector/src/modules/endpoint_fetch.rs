//! Single endpoint workflow: resolve, fan out, store.

use std::time::Instant;

use chrono::Local;

use fundlake_core::{OutputFormat, Overrides};
use fundlake_data::{fetch_all, FetchJob};

use crate::context::CollectorContext;
use crate::error::Result;
use crate::stats::CollectionStats;

/// What to fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub endpoint: String,
    pub sub_endpoint: Option<String>,
    pub overrides: Overrides,
    /// Overrides the configured output format
    pub format: Option<OutputFormat>,
}

impl FetchRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn sub_endpoint(mut self, sub_endpoint: impl Into<String>) -> Self {
        self.sub_endpoint = Some(sub_endpoint.into());
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn format(mut self, format: Option<OutputFormat>) -> Self {
        self.format = format;
        self
    }
}

/// Fetch one endpoint for `tickers` and write the dataset.
///
/// Settings errors surface before any request. A table with no rows is not
/// written.
pub async fn fetch_endpoint(
    ctx: &CollectorContext,
    request: &FetchRequest,
    tickers: &[String],
) -> Result<CollectionStats> {
    let start = Instant::now();
    let config = ctx.tables.resolve(
        &request.endpoint,
        request.sub_endpoint.as_deref(),
        &request.overrides,
    )?;
    let job = FetchJob::new(&ctx.client, &config);

    let outcome = fetch_all(&job, tickers).await;

    let writer = ctx.writer_for(request.format);
    let today = Local::now().date_naive();
    if outcome.table.is_empty() {
        tracing::warn!(dataset = %outcome.dataset, "No rows fetched, nothing written");
    } else {
        writer.write(&outcome.dataset, &outcome.table, today)?;
    }
    if ctx.config.app.output.record_api_calls {
        writer.write_call_log(&outcome.dataset, &outcome.calls, today)?;
    }

    let stats = CollectionStats::from_batch(&outcome, start.elapsed());
    stats.log_summary(&outcome.dataset);
    Ok(stats)
}
