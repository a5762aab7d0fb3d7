//! iShares fund holdings.
//!
//! The holdings export is a CSV with a free-text preamble (fund name, as-of
//! date, ...) above the header row and a disclaimer footer below the data.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fundlake_core::{is_alphabetic_ticker, normalize_ticker, IndexFund};

use crate::error::{DataError, Result};
use crate::provider::transport::JsonTransport;

const TICKER_HEADER: &str = "Ticker";
const NAME_HEADER: &str = "Name";
const ASSET_CLASS_HEADER: &str = "Asset Class";
const EXCHANGE_HEADER: &str = "Exchange";

/// Asset class kept in the universe.
pub const EQUITY_ASSET_CLASS: &str = "Equity";

/// One fund holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub name: Option<String>,
    pub asset_class: String,
    pub exchange: String,
}

/// Parse a holdings export, skipping `skip_rows` preamble lines.
///
/// Rows without a ticker (footer text, blank lines) are dropped.
pub fn parse_holdings(text: &str, skip_rows: usize) -> Result<Vec<Holding>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body: String = text.split_inclusive('\n').skip(skip_rows).collect();

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let ticker_col = position(TICKER_HEADER).ok_or_else(|| {
        DataError::InvalidData(format!("holdings header has no '{}' column", TICKER_HEADER))
    })?;
    let asset_class_col = position(ASSET_CLASS_HEADER);
    let exchange_col = position(EXCHANGE_HEADER);
    let name_col = position(NAME_HEADER);

    let mut holdings = Vec::new();
    for record in reader.records() {
        let record = record?;
        let ticker = record.get(ticker_col).map(normalize_ticker).unwrap_or_default();
        if ticker.is_empty() {
            continue;
        }
        let cell = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(str::to_string)
                .unwrap_or_default()
        };

        holdings.push(Holding {
            ticker,
            name: Some(cell(name_col)).filter(|n| !n.is_empty()),
            asset_class: cell(asset_class_col),
            exchange: cell(exchange_col),
        });
    }

    Ok(holdings)
}

/// Which holdings count as index members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingsFilter {
    /// Accepted exchange names, exact match
    pub exchanges: Vec<String>,
    /// Drop tickers with non-letter characters
    pub require_alphabetic: bool,
}

impl HoldingsFilter {
    pub fn accepts(&self, holding: &Holding) -> bool {
        holding.asset_class == EQUITY_ASSET_CLASS
            && self.exchanges.iter().any(|e| *e == holding.exchange)
            && (!self.require_alphabetic || is_alphabetic_ticker(&holding.ticker))
    }
}

/// Download and parse one fund's holdings.
pub async fn fetch_holdings(
    transport: &dyn JsonTransport,
    fund: &IndexFund,
    skip_rows: usize,
) -> Result<Vec<Holding>> {
    debug!(index = %fund.name, "Downloading holdings");

    let text = transport
        .get_text(&fund.url)
        .await
        .map_err(|e| DataError::source_failed(format!("ishares {}", fund.name), e))?;

    let holdings = parse_holdings(&text, skip_rows)
        .map_err(|e| DataError::source_failed(format!("ishares {}", fund.name), e))?;

    info!(index = %fund.name, holdings = holdings.len(), "Fetched holdings");
    Ok(holdings)
}
