//! Resolved per-endpoint configuration.
//!
//! An [`EndpointConfig`] is produced once per fetch invocation by
//! [`SettingsTables::resolve`](crate::settings::SettingsTables::resolve) and is
//! read-only afterwards, so it can be shared by every concurrent ticker fetch.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{CoreError, CoreResult};

/// Setting key: concurrency limiter size.
pub const SETTING_SIMULTANEOUS_CONNECTIONS: &str = "simultaneous_connections";
/// Setting key: pacing delay in seconds after every attempt.
pub const SETTING_API_DELAY: &str = "api_delay";
/// Setting key: attempts per ticker.
pub const SETTING_QUERY_MAX: &str = "query_max";

/// Endpoints that answer with a single JSON object per ticker.
const SINGLE_OBJECT_ENDPOINTS: &[&str] = &["profile", "profile2", "price-target", "quote"];

/// Endpoints that answer with parallel arrays (one array per column).
const COLUMNAR_ENDPOINTS: &[&str] = &["candle"];

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl ParamValue {
    /// Parse a raw table cell; integers stay integers.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(v) => ParamValue::Int(v),
            Err(_) => ParamValue::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Typed API connection settings after layering.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Maximum in-flight requests
    pub simultaneous_connections: usize,
    /// Delay charged after every attempt
    pub api_delay: Duration,
    /// Attempts per ticker
    pub query_max: u32,
    /// Every merged setting, including ones not interpreted here
    pub raw: IndexMap<String, String>,
}

impl ApiSettings {
    /// Interpret a merged settings map.
    pub fn from_map(endpoint: &str, raw: IndexMap<String, String>) -> CoreResult<Self> {
        let simultaneous_connections: usize =
            parse_required(endpoint, &raw, SETTING_SIMULTANEOUS_CONNECTIONS)?;
        if simultaneous_connections == 0 {
            return Err(invalid(SETTING_SIMULTANEOUS_CONNECTIONS, "0", "must be at least 1"));
        }
        if simultaneous_connections > Semaphore::MAX_PERMITS {
            return Err(invalid(
                SETTING_SIMULTANEOUS_CONNECTIONS,
                &simultaneous_connections.to_string(),
                &format!("must be at most {}", Semaphore::MAX_PERMITS),
            ));
        }

        let delay_secs: f64 = parse_required(endpoint, &raw, SETTING_API_DELAY)?;
        let api_delay = Duration::try_from_secs_f64(delay_secs).map_err(|e| {
            invalid(
                SETTING_API_DELAY,
                &delay_secs.to_string(),
                &format!("must be a non-negative number of seconds ({})", e),
            )
        })?;

        let query_max: u32 = parse_required(endpoint, &raw, SETTING_QUERY_MAX)?;
        if query_max == 0 {
            return Err(invalid(SETTING_QUERY_MAX, "0", "must be at least 1"));
        }

        Ok(Self {
            simultaneous_connections,
            api_delay,
            query_max,
            raw,
        })
    }
}

fn parse_required<T: std::str::FromStr>(
    endpoint: &str,
    raw: &IndexMap<String, String>,
    key: &str,
) -> CoreResult<T>
where
    T::Err: fmt::Display,
{
    let value = raw.get(key).ok_or_else(|| CoreError::MissingSetting {
        endpoint: endpoint.to_string(),
        setting: key.to_string(),
    })?;
    // Settings exported from dataframes may carry a trailing ".0".
    let cleaned = value.trim();
    let cleaned = cleaned.strip_suffix(".0").unwrap_or(cleaned);
    cleaned
        .parse::<T>()
        .or_else(|_| value.trim().parse::<T>())
        .map_err(|e| invalid(key, value, &e.to_string()))
}

fn invalid(setting: &str, value: &str, reason: &str) -> CoreError {
    CoreError::InvalidSetting {
        setting: setting.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Response parsing keys for an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataKeys {
    /// JSON key holding the result array
    pub data_json_key: Option<String>,
    /// Column identifying a row within one ticker
    pub primary_key: Option<String>,
}

/// How a JSON payload becomes table rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    /// Object whose `key` holds an array of rows
    Nested { key: String },
    /// Object of parallel arrays; scalars are broadcast
    Columnar,
    /// One object, one row
    SingleObject,
    /// Bare array of rows
    Rows,
}

impl Normalization {
    /// Pick the strategy for an endpoint. A configured data key always wins.
    pub fn resolve(endpoint: &str, data_keys: &DataKeys) -> Self {
        if let Some(key) = &data_keys.data_json_key {
            return Normalization::Nested { key: key.clone() };
        }
        if COLUMNAR_ENDPOINTS.contains(&endpoint) {
            Normalization::Columnar
        } else if SINGLE_OBJECT_ENDPOINTS.contains(&endpoint) {
            Normalization::SingleObject
        } else {
            Normalization::Rows
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::Nested { key } => write!(f, "nested[{}]", key),
            Normalization::Columnar => write!(f, "columnar"),
            Normalization::SingleObject => write!(f, "single_object"),
            Normalization::Rows => write!(f, "rows"),
        }
    }
}

/// Caller-supplied overrides, applied after every table layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// API setting overrides
    pub settings: IndexMap<String, String>,
    /// Query parameter overrides
    pub params: IndexMap<String, ParamValue>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override one API setting.
    pub fn setting(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.settings.insert(key.into(), value.to_string());
        self
    }

    /// Override one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parse `key=value` pairs as given on the command line.
    pub fn parse_pairs(pairs: &[String]) -> CoreResult<IndexMap<String, String>> {
        let mut parsed = IndexMap::new();
        for pair in pairs {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                CoreError::InvalidInput(format!("expected key=value, got '{}'", pair))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CoreError::InvalidInput(format!("empty key in '{}'", pair)));
            }
            parsed.insert(key.to_string(), value.trim().to_string());
        }
        Ok(parsed)
    }
}

/// Fully resolved configuration for one endpoint fetch.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Endpoint name (e.g. `profile`, `financials`)
    pub endpoint: String,
    /// Sub-endpoint name (e.g. `bs_annual`)
    pub sub_endpoint: Option<String>,
    /// Connection settings
    pub api: ApiSettings,
    /// Query parameters in URL order
    pub params: IndexMap<String, ParamValue>,
    /// Response parsing keys
    pub data_keys: DataKeys,
    /// Response normalization strategy
    pub normalization: Normalization,
}

impl EndpointConfig {
    /// Name used for output files: `endpoint` or `endpoint_sub`.
    pub fn dataset_name(&self) -> String {
        match &self.sub_endpoint {
            Some(sub) => format!("{}_{}", self.endpoint, sub),
            None => self.endpoint.clone(),
        }
    }
}
