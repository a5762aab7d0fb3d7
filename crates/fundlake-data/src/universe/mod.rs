//! Investable universe.
//!
//! Tickers held by the configured index funds (plus a fixed list of extras),
//! kept only if Finnhub lists them. Each ticker carries one membership count
//! per index, in fund order.

pub mod cache;
pub mod source;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use fundlake_core::{normalize_ticker, UniverseConfig};

use crate::error::{DataError, Result};
use crate::provider::ishares::{Holding, HoldingsFilter};

pub use cache::{load_or_build, UniverseCache, UNIVERSE_FILE};
pub use source::{RemoteUniverseSource, UniverseSource};

/// One universe ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub ticker: String,
    /// Holdings rows per index, aligned with [`Universe::index_names`]
    pub memberships: Vec<u32>,
}

/// Universe sorted by ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Universe {
    index_names: Vec<String>,
    entries: Vec<UniverseEntry>,
}

impl Universe {
    /// Entries are sorted by ticker; each must carry one count per index.
    pub fn new(index_names: Vec<String>, mut entries: Vec<UniverseEntry>) -> Result<Self> {
        if let Some(bad) = entries
            .iter()
            .find(|e| e.memberships.len() != index_names.len())
        {
            return Err(DataError::InvalidData(format!(
                "ticker {} has {} membership values, expected {}",
                bad.ticker,
                bad.memberships.len(),
                index_names.len()
            )));
        }
        entries.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(Self {
            index_names,
            entries,
        })
    }

    pub fn index_names(&self) -> &[String] {
        &self.index_names
    }

    pub fn entries(&self) -> &[UniverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.ticker.clone()).collect()
    }

    /// Tickers in random order.
    pub fn shuffled_tickers<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut tickers = self.tickers();
        tickers.shuffle(rng);
        tickers
    }

    fn entry(&self, ticker: &str) -> Option<&UniverseEntry> {
        self.entries
            .binary_search_by(|e| e.ticker.as_str().cmp(ticker))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.entry(ticker).is_some()
    }

    /// Membership count of `ticker` in `index`; `None` if either is unknown.
    pub fn membership(&self, ticker: &str, index: &str) -> Option<u32> {
        let col = self.index_names.iter().position(|n| n == index)?;
        self.entry(ticker).map(|e| e.memberships[col])
    }

    /// Whether `ticker` is held by `index` at least once.
    pub fn is_member(&self, ticker: &str, index: &str) -> Option<bool> {
        self.membership(ticker, index).map(|count| count > 0)
    }

    /// Number of tickers held by each index.
    pub fn index_sizes(&self) -> Vec<(String, usize)> {
        self.index_names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let size = self
                    .entries
                    .iter()
                    .filter(|e| e.memberships[col] > 0)
                    .count();
                (name.clone(), size)
            })
            .collect()
    }
}

/// Holdings downloaded for one index.
#[derive(Debug, Clone)]
pub struct IndexHoldings {
    pub index_name: String,
    pub holdings: Vec<Holding>,
}

/// Combine holdings, extras and the symbol directory into a universe.
///
/// Each accepted holdings row adds one to its ticker's count for that
/// index. Extra tickers enter with zero counts. Tickers missing from
/// `directory` are dropped.
pub fn assemble(
    indices: &[IndexHoldings],
    filter: &HoldingsFilter,
    extra_tickers: &[String],
    directory: &HashSet<String>,
) -> Universe {
    let index_names: Vec<String> = indices.iter().map(|i| i.index_name.clone()).collect();
    let width = index_names.len();
    let mut counts: BTreeMap<String, Vec<u32>> = BTreeMap::new();

    for (col, index) in indices.iter().enumerate() {
        for holding in index.holdings.iter().filter(|h| filter.accepts(h)) {
            counts
                .entry(holding.ticker.clone())
                .or_insert_with(|| vec![0; width])[col] += 1;
        }
    }

    for ticker in extra_tickers {
        counts
            .entry(normalize_ticker(ticker))
            .or_insert_with(|| vec![0; width]);
    }

    let candidates = counts.len();
    let entries: Vec<UniverseEntry> = counts
        .into_iter()
        .filter(|(ticker, _)| directory.contains(ticker))
        .map(|(ticker, memberships)| UniverseEntry {
            ticker,
            memberships,
        })
        .collect();

    info!(
        candidates,
        supported = entries.len(),
        "Universe assembled"
    );

    Universe {
        index_names,
        entries,
    }
}

/// Builds a fresh universe from remote sources.
pub struct UniverseBuilder {
    config: UniverseConfig,
    source: Arc<dyn UniverseSource>,
}

impl UniverseBuilder {
    pub fn new(config: UniverseConfig, source: Arc<dyn UniverseSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// Download every fund's holdings and the symbol directory. Any source
    /// failure fails the build.
    pub async fn build(&self) -> Result<Universe> {
        let source = self.source.as_ref();
        let holdings = try_join_all(self.config.index_funds.iter().map(|fund| async move {
            source.holdings(fund).await.map(|holdings| IndexHoldings {
                index_name: fund.name.clone(),
                holdings,
            })
        }))
        .await?;

        let directory: HashSet<String> = source
            .symbols()
            .await?
            .into_iter()
            .map(|listing| listing.symbol)
            .collect();

        let filter = HoldingsFilter {
            exchanges: self.config.exchanges.clone(),
            require_alphabetic: self.config.require_alphabetic,
        };

        Ok(assemble(
            &holdings,
            &filter,
            &self.config.extra_tickers,
            &directory,
        ))
    }
}
