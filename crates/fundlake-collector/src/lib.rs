//! Finnhub dataset collector.
//!
//! Runs the collection workflows on top of `fundlake-data`:
//! - investable universe sync (iShares holdings ∩ Finnhub directory)
//! - single endpoint fetch with caller overrides
//! - the fundamentals batch (profile, statements, estimates)
//! - daily candles

pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use context::CollectorContext;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
