//! Collector error type.

use std::fmt;

use fundlake_core::CoreError;
use fundlake_data::DataError;

/// Collector error.
#[derive(Debug)]
pub enum CollectorError {
    /// Missing or invalid configuration (API key, CLI arguments)
    Config(String),
    /// Settings tables or app config
    Core(CoreError),
    /// Remote source or dataset storage
    Data(DataError),
    /// Filesystem
    Io(std::io::Error),
    /// Anything else
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl CollectorError {
    /// Errors that must stop the run instead of skipping one endpoint.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Core(e) => e.is_fatal(),
            Self::Data(DataError::Config(e)) => e.is_fatal(),
            _ => false,
        }
    }
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Core(e) => write!(f, "{}", e),
            Self::Data(e) => write!(f, "{}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(e) => Some(e),
            Self::Data(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<fundlake_data::FetchError> for CollectorError {
    fn from(err: fundlake_data::FetchError) -> Self {
        Self::Data(DataError::Http(err))
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CollectorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, CollectorError>;
