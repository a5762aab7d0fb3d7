//! Daily candle workflow.

use chrono::{Days, Local, NaiveDate};

use fundlake_core::{Overrides, ParamValue};

use crate::context::CollectorContext;
use crate::error::{CollectorError, Result};
use crate::modules::endpoint_fetch::{fetch_endpoint, FetchRequest};
use crate::stats::CollectionStats;

/// Candle window and resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleOptions {
    /// Window start, in days before today
    pub days: u64,
    /// Finnhub resolution (`1`, `5`, `D`, `W`, ...)
    pub resolution: String,
}

impl Default for CandleOptions {
    fn default() -> Self {
        Self {
            days: 8,
            resolution: "D".to_string(),
        }
    }
}

/// `(from, to)` UNIX seconds: local midnight of `today - days` and of
/// `today - 1 day`.
pub fn candle_window(today: NaiveDate, days: u64) -> Result<(i64, i64)> {
    if days == 0 {
        return Err(CollectorError::Config(
            "candle window must span at least one day".to_string(),
        ));
    }

    let midnight = |date: Option<NaiveDate>| {
        date.and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|dt| dt.and_local_timezone(Local).earliest())
            .map(|dt| dt.timestamp())
            .ok_or_else(|| CollectorError::Config(format!("no local midnight for {}", today)))
    };

    let from = midnight(today.checked_sub_days(Days::new(days)))?;
    let to = midnight(today.checked_sub_days(Days::new(1)))?;
    Ok((from, to))
}

/// Candle request with `resolution`, `from` and `to` set.
pub fn candle_request(today: NaiveDate, options: &CandleOptions) -> Result<FetchRequest> {
    let (from, to) = candle_window(today, options.days)?;
    let overrides = Overrides::new()
        .param("resolution", ParamValue::parse(&options.resolution))
        .param("from", from)
        .param("to", to);
    Ok(FetchRequest::new("candle").overrides(overrides))
}

/// Fetch candles for `tickers` over the configured window.
pub async fn collect_candles(
    ctx: &CollectorContext,
    tickers: &[String],
    options: &CandleOptions,
) -> Result<CollectionStats> {
    let request = candle_request(Local::now().date_naive(), options)?;
    tracing::info!(days = options.days, resolution = %options.resolution, "Fetching candles");
    fetch_endpoint(ctx, &request, tickers).await
}
