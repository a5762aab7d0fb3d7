//! Collection workflows.

pub mod candles;
pub mod endpoint_fetch;
pub mod fundamentals;
pub mod universe_sync;

pub use candles::{candle_window, collect_candles, CandleOptions};
pub use endpoint_fetch::{fetch_endpoint, FetchRequest};
pub use fundamentals::{collect_fundamentals, fundamental_requests, FUNDAMENTAL_ENDPOINTS};
pub use universe_sync::{resolve_tickers, sync_universe};
