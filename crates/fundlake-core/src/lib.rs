//! # Fundlake Core
//!
//! Shared building blocks for the Finnhub collector:
//! - application configuration (`AppConfig`)
//! - settings tables and the layered endpoint resolver
//! - the resolved endpoint model and response normalization strategy
//! - bounded retry with pacing
//! - logging infrastructure

pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod retry;
pub mod settings;
pub mod types;

pub use config::*;
pub use endpoint::*;
pub use error::*;
pub use logging::*;
pub use retry::*;
pub use settings::*;
pub use types::*;
