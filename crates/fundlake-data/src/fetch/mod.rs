//! Endpoint fetching.
//!
//! - [`normalize`]: payload → rows, per normalization strategy
//! - [`ticker`]: one ticker with retry and pacing
//! - [`batch`]: bounded-concurrency fan-out over all tickers

pub mod batch;
pub mod normalize;
pub mod ticker;

pub use batch::{fetch_all, BatchOutcome};
pub use normalize::{is_empty_payload, normalize, Record, TICKER_COLUMN};
pub use ticker::{FetchJob, TickerOutcome, TickerReport};
