//! Remote inputs of the universe build.

use async_trait::async_trait;

use fundlake_core::IndexFund;

use crate::error::Result;
use crate::provider::finnhub::{FinnhubClient, SymbolListing};
use crate::provider::ishares::{fetch_holdings, Holding};

/// Where holdings and the symbol directory come from.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    /// Unfiltered holdings of one fund.
    async fn holdings(&self, fund: &IndexFund) -> Result<Vec<Holding>>;

    /// Symbols Finnhub supports.
    async fn symbols(&self) -> Result<Vec<SymbolListing>>;
}

/// iShares downloads plus the Finnhub symbol directory.
pub struct RemoteUniverseSource {
    client: FinnhubClient,
    exchange: String,
    skip_rows: usize,
}

impl RemoteUniverseSource {
    pub fn new(client: FinnhubClient, exchange: impl Into<String>, skip_rows: usize) -> Self {
        Self {
            client,
            exchange: exchange.into(),
            skip_rows,
        }
    }
}

#[async_trait]
impl UniverseSource for RemoteUniverseSource {
    async fn holdings(&self, fund: &IndexFund) -> Result<Vec<Holding>> {
        fetch_holdings(self.client.transport(), fund, self.skip_rows).await
    }

    async fn symbols(&self) -> Result<Vec<SymbolListing>> {
        self.client.symbol_directory(&self.exchange).await
    }
}
