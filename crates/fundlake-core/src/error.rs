//! Error types shared by configuration and settings resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Core configuration error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Application config could not be built or deserialized
    #[error("Config error: {0}")]
    Config(String),

    /// A settings table could not be read from disk
    #[error("Failed to load settings table {path}: {reason}")]
    SettingsLoad { path: PathBuf, reason: String },

    /// A required API setting is absent after layering
    #[error("Missing API setting '{setting}' for endpoint '{endpoint}'")]
    MissingSetting { endpoint: String, setting: String },

    /// An API setting is present but cannot be used
    #[error("Invalid API setting '{setting}' = '{value}': {reason}")]
    InvalidSetting {
        setting: String,
        value: String,
        reason: String,
    },

    /// Invalid caller input (override syntax, ticker lists)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Errors that must stop the whole run before any request is made.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_)
                | CoreError::SettingsLoad { .. }
                | CoreError::MissingSetting { .. }
                | CoreError::InvalidSetting { .. }
        )
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_errors_are_fatal() {
        let err = CoreError::SettingsLoad {
            path: PathBuf::from("finnhub/configs/api_settings.csv"),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.is_fatal());

        let err = CoreError::InvalidInput("bad override".to_string());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::MissingSetting {
            endpoint: "candle".to_string(),
            setting: "query_max".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing API setting 'query_max' for endpoint 'candle'"
        );
    }
}
