//! Finnhub data collection.
//!
//! This crate provides:
//! - HTTP transport and Finnhub / iShares providers
//! - per-ticker fetching with retry, pacing and normalization
//! - bounded-concurrency fan-out over a ticker list
//! - the investable universe builder with a same-day cache
//! - CSV / JSONL dataset writers

pub mod error;
pub mod fetch;
pub mod provider;
pub mod storage;
pub mod table;
pub mod universe;

pub use error::{DataError, FetchError, Result};
pub use fetch::{fetch_all, BatchOutcome, FetchJob, Record, TickerOutcome, TickerReport};
pub use provider::{EndpointUrl, FinnhubClient, HttpTransport, JsonTransport, SymbolListing};
pub use storage::DatasetWriter;
pub use table::RecordTable;
pub use universe::{
    load_or_build, RemoteUniverseSource, Universe, UniverseBuilder, UniverseCache, UniverseEntry,
    UniverseSource,
};
