//! Investable universe workflow.

use fundlake_core::parse_ticker_list;
use fundlake_data::universe::load_or_build;
use fundlake_data::Universe;

use crate::context::CollectorContext;
use crate::error::{CollectorError, Result};

/// Load today's universe or rebuild it.
pub async fn sync_universe(ctx: &CollectorContext, refresh: bool) -> Result<Universe> {
    let universe = load_or_build(&ctx.universe_builder(), &ctx.universe_cache(), refresh).await?;

    for (index, size) in universe.index_sizes() {
        tracing::info!(index = %index, tickers = size, "Index membership");
    }
    tracing::info!(tickers = universe.len(), "Investable universe ready");

    Ok(universe)
}

/// Tickers for a fetch: the explicit list if given, otherwise the universe
/// (shuffled unless disabled in config).
pub async fn resolve_tickers(ctx: &CollectorContext, explicit: Option<&str>) -> Result<Vec<String>> {
    if let Some(raw) = explicit {
        let tickers = parse_ticker_list(raw);
        if tickers.is_empty() {
            return Err(CollectorError::Config("ticker list is empty".to_string()));
        }
        return Ok(tickers);
    }

    let universe = sync_universe(ctx, false).await?;
    let tickers = if ctx.config.app.universe.shuffle_tickers {
        universe.shuffled_tickers(&mut rand::thread_rng())
    } else {
        universe.tickers()
    };
    Ok(tickers)
}
