//! Data module error types.

use thiserror::Error;

/// Failure of a single Finnhub request attempt.
///
/// Messages never contain the request URL, which carries the API token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS or body transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the per-request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Non-2xx HTTP status
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Body is not valid JSON
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Valid JSON that does not match the endpoint's normalization strategy
    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

impl FetchError {
    /// Transport-level failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::Status { .. }
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Universe, directory and storage errors.
#[derive(Debug, Error)]
pub enum DataError {
    /// Remote source unreachable or answered with an error
    #[error("Data source error ({source_name}): {reason}")]
    DataSource { source_name: String, reason: String },

    /// HTTP failure while fetching a source
    #[error("HTTP error: {0}")]
    Http(#[from] FetchError),

    /// CSV read/write failure
    #[error("CSV error: {0}")]
    Csv(String),

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input data failed validation
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(#[from] fundlake_core::CoreError),
}

impl DataError {
    pub fn source_failed(source_name: impl Into<String>, reason: impl ToString) -> Self {
        DataError::DataSource {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
