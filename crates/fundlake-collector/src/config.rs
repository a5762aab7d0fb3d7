//! Collector configuration: app config file plus secrets from the environment.

use std::path::Path;

use secrecy::SecretString;

use fundlake_core::AppConfig;

use crate::error::{CollectorError, Result};

/// Environment variable holding the Finnhub token.
pub const API_KEY_VAR: &str = "FINNHUB_API_KEY";

/// Collector configuration.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Layered application config
    pub app: AppConfig,
    /// Finnhub API token
    pub api_key: SecretString,
}

impl CollectorConfig {
    pub fn new(app: AppConfig, api_key: SecretString) -> Self {
        Self { app, api_key }
    }

    /// Load `.env`, the app config (`path` or the default location) and the API key.
    pub fn from_env(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let app = match path {
            Some(path) => AppConfig::load(Some(path))?,
            None => AppConfig::load_default()?,
        };

        let api_key = env_var(API_KEY_VAR).ok_or_else(|| {
            CollectorError::Config(format!("{} environment variable is not set", API_KEY_VAR))
        })?;

        Ok(Self::new(app, SecretString::from(api_key)))
    }
}

/// Non-blank environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
