//! Remote data providers.
//!
//! ## Finnhub
//! - `EndpointUrl`: per-endpoint URL template bound per ticker
//! - `FinnhubClient`: shared transport, base URL and API key; symbol directory
//!
//! ## iShares
//! - holdings CSV parsing and filtering for index membership

pub mod finnhub;
pub mod ishares;
pub mod transport;

pub use finnhub::{endpoint_url, EndpointUrl, FinnhubClient, SymbolListing};
pub use ishares::{parse_holdings, Holding, HoldingsFilter};
pub use transport::{HttpTransport, JsonTransport};
