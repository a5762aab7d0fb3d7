//! Settings tables and the layered endpoint config resolver.
//!
//! Three CSV tables live in the config directory:
//!
//! | File | Columns |
//! |------|---------|
//! | `api_settings.csv` | `endpoint,sub_endpoint,setting,value` |
//! | `endpoint_parameters.csv` | `endpoint,sub_endpoint,parameter,value` |
//! | `endpoint_data_keys.csv` | `endpoint,data_json_key,primary_key` |
//!
//! Empty cells are nulls. Layer precedence, lowest first:
//! `default` → endpoint → sub-endpoint → caller overrides.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::endpoint::{ApiSettings, DataKeys, EndpointConfig, Normalization, Overrides, ParamValue};
use crate::error::{CoreError, CoreResult};

/// Endpoint name of the global default layer.
pub const DEFAULT_ENDPOINT: &str = "default";

pub const API_SETTINGS_FILE: &str = "api_settings.csv";
pub const ENDPOINT_PARAMETERS_FILE: &str = "endpoint_parameters.csv";
pub const ENDPOINT_DATA_KEYS_FILE: &str = "endpoint_data_keys.csv";

/// One row of `api_settings.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettingRow {
    pub endpoint: String,
    #[serde(default)]
    pub sub_endpoint: Option<String>,
    pub setting: String,
    pub value: String,
}

/// One row of `endpoint_parameters.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub endpoint: String,
    #[serde(default)]
    pub sub_endpoint: Option<String>,
    pub parameter: String,
    pub value: String,
}

/// One row of `endpoint_data_keys.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataKeyRow {
    pub endpoint: String,
    #[serde(default)]
    pub data_json_key: Option<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl ApiSettingRow {
    pub fn new(endpoint: &str, sub_endpoint: Option<&str>, setting: &str, value: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            sub_endpoint: sub_endpoint.map(str::to_string),
            setting: setting.to_string(),
            value: value.to_string(),
        }
    }
}

impl ParameterRow {
    pub fn new(endpoint: &str, sub_endpoint: Option<&str>, parameter: &str, value: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            sub_endpoint: sub_endpoint.map(str::to_string),
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }
}

impl DataKeyRow {
    pub fn new(endpoint: &str, data_json_key: Option<&str>, primary_key: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            data_json_key: data_json_key.map(str::to_string),
            primary_key: primary_key.map(str::to_string),
        }
    }
}

/// Immutable settings tables, loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct SettingsTables {
    api_settings: Vec<ApiSettingRow>,
    parameters: Vec<ParameterRow>,
    data_keys: Vec<DataKeyRow>,
}

impl SettingsTables {
    pub fn new(
        api_settings: Vec<ApiSettingRow>,
        parameters: Vec<ParameterRow>,
        data_keys: Vec<DataKeyRow>,
    ) -> Self {
        Self {
            api_settings: api_settings.into_iter().map(ApiSettingRow::cleaned).collect(),
            parameters: parameters.into_iter().map(ParameterRow::cleaned).collect(),
            data_keys: data_keys.into_iter().map(DataKeyRow::cleaned).collect(),
        }
    }

    /// Load all three tables from `dir`. Any failure is fatal for the run.
    pub fn load(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let dir = dir.as_ref();
        let api_settings = read_table::<ApiSettingRow>(&dir.join(API_SETTINGS_FILE))?;
        let parameters = read_table::<ParameterRow>(&dir.join(ENDPOINT_PARAMETERS_FILE))?;
        let data_keys = read_table::<DataKeyRow>(&dir.join(ENDPOINT_DATA_KEYS_FILE))?;
        Ok(Self::new(api_settings, parameters, data_keys))
    }

    /// Resolve the configuration for one endpoint / sub-endpoint.
    pub fn resolve(
        &self,
        endpoint: &str,
        sub_endpoint: Option<&str>,
        overrides: &Overrides,
    ) -> CoreResult<EndpointConfig> {
        let api = ApiSettings::from_map(endpoint, self.merged_settings(endpoint, sub_endpoint, overrides))?;
        let params = self.merged_params(endpoint, sub_endpoint, overrides);
        let data_keys = self.data_keys_for(endpoint);
        let normalization = Normalization::resolve(endpoint, &data_keys);

        debug!(
            endpoint,
            sub_endpoint = ?sub_endpoint,
            connections = api.simultaneous_connections,
            api_delay = ?api.api_delay,
            query_max = api.query_max,
            params = params.len(),
            normalization = %normalization,
            "Endpoint config resolved"
        );

        Ok(EndpointConfig {
            endpoint: endpoint.to_string(),
            sub_endpoint: sub_endpoint.map(str::to_string),
            api,
            params,
            data_keys,
            normalization,
        })
    }

    fn merged_settings(
        &self,
        endpoint: &str,
        sub_endpoint: Option<&str>,
        overrides: &Overrides,
    ) -> IndexMap<String, String> {
        let mut merged = IndexMap::new();
        for (layer_endpoint, layer_sub) in layers(endpoint, sub_endpoint) {
            for row in self
                .api_settings
                .iter()
                .filter(|r| r.endpoint == layer_endpoint && r.sub_endpoint.as_deref() == layer_sub)
            {
                merged.insert(row.setting.clone(), row.value.clone());
            }
        }
        for (key, value) in &overrides.settings {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    fn merged_params(
        &self,
        endpoint: &str,
        sub_endpoint: Option<&str>,
        overrides: &Overrides,
    ) -> IndexMap<String, ParamValue> {
        let mut merged = IndexMap::new();
        for (layer_endpoint, layer_sub) in layers(endpoint, sub_endpoint) {
            let rows: Vec<&ParameterRow> = self
                .parameters
                .iter()
                .filter(|r| r.endpoint == layer_endpoint && r.sub_endpoint.as_deref() == layer_sub)
                .collect();

            if rows.is_empty() && layer_sub.is_some() {
                debug!(
                    endpoint,
                    sub_endpoint = ?layer_sub,
                    "No sub-endpoint parameters, using endpoint-level parameters"
                );
            }

            for row in rows {
                merged.insert(row.parameter.clone(), ParamValue::parse(&row.value));
            }
        }
        for (key, value) in &overrides.params {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    fn data_keys_for(&self, endpoint: &str) -> DataKeys {
        self.data_keys
            .iter()
            .find(|r| r.endpoint == endpoint)
            .map(|r| DataKeys {
                data_json_key: r.data_json_key.clone(),
                primary_key: r.primary_key.clone(),
            })
            .unwrap_or_default()
    }
}

/// Table layers in precedence order. The default layer never has a sub-endpoint.
fn layers<'a>(endpoint: &'a str, sub_endpoint: Option<&'a str>) -> Vec<(&'a str, Option<&'a str>)> {
    let mut layers = vec![(DEFAULT_ENDPOINT, None)];
    if endpoint != DEFAULT_ENDPOINT {
        layers.push((endpoint, None));
    }
    if let Some(sub) = sub_endpoint {
        layers.push((endpoint, Some(sub)));
    }
    layers
}

fn read_table<T: DeserializeOwned>(path: &Path) -> CoreResult<Vec<T>> {
    let load_error = |reason: String| {
        error!(path = %path.display(), reason = %reason, "Failed to load settings table");
        CoreError::SettingsLoad {
            path: PathBuf::from(path),
            reason,
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| load_error(e.to_string()))?;

    let rows = reader
        .deserialize::<T>()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| load_error(e.to_string()))?;

    info!(path = %path.display(), rows = rows.len(), "Loaded settings table");
    Ok(rows)
}

/// Blank strings are nulls, whatever the source of the row.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ApiSettingRow {
    fn cleaned(mut self) -> Self {
        self.sub_endpoint = non_blank(self.sub_endpoint);
        self
    }
}

impl ParameterRow {
    fn cleaned(mut self) -> Self {
        self.sub_endpoint = non_blank(self.sub_endpoint);
        self
    }
}

impl DataKeyRow {
    fn cleaned(mut self) -> Self {
        self.data_json_key = non_blank(self.data_json_key);
        self.primary_key = non_blank(self.primary_key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use std::time::Duration;

    fn base_settings() -> Vec<ApiSettingRow> {
        vec![
            ApiSettingRow::new("default", None, "simultaneous_connections", "10"),
            ApiSettingRow::new("default", None, "api_delay", "2"),
            ApiSettingRow::new("default", None, "query_max", "5"),
        ]
    }

    #[test]
    fn test_default_settings_only() {
        let tables = SettingsTables::new(base_settings(), vec![], vec![]);
        let config = tables.resolve("profile2", None, &Overrides::new()).unwrap();

        assert_eq!(config.api.simultaneous_connections, 10);
        assert_eq!(config.api.api_delay, Duration::from_secs(2));
        assert_eq!(config.api.query_max, 5);
        assert!(config.params.is_empty());
        assert_eq!(config.data_keys, DataKeys::default());
    }

    #[test]
    fn test_settings_precedence() {
        let mut rows = base_settings();
        rows.push(ApiSettingRow::new("financials", None, "simultaneous_connections", "4"));
        rows.push(ApiSettingRow::new("financials", None, "api_delay", "1"));
        rows.push(ApiSettingRow::new("financials", Some("bs_annual"), "simultaneous_connections", "2"));
        let tables = SettingsTables::new(rows, vec![], vec![]);

        let endpoint_only = tables.resolve("financials", None, &Overrides::new()).unwrap();
        assert_eq!(endpoint_only.api.simultaneous_connections, 4);
        assert_eq!(endpoint_only.api.api_delay, Duration::from_secs(1));

        let sub = tables
            .resolve("financials", Some("bs_annual"), &Overrides::new())
            .unwrap();
        assert_eq!(sub.api.simultaneous_connections, 2);
        assert_eq!(sub.api.api_delay, Duration::from_secs(1));
        assert_eq!(sub.api.query_max, 5);

        let overridden = tables
            .resolve(
                "financials",
                Some("bs_annual"),
                &Overrides::new().setting("simultaneous_connections", 1),
            )
            .unwrap();
        assert_eq!(overridden.api.simultaneous_connections, 1);
    }

    #[test]
    fn test_sub_endpoint_settings_ignored_without_sub_endpoint() {
        let mut rows = base_settings();
        rows.push(ApiSettingRow::new("financials", Some("bs_annual"), "query_max", "9"));
        let tables = SettingsTables::new(rows, vec![], vec![]);

        let config = tables.resolve("financials", None, &Overrides::new()).unwrap();
        assert_eq!(config.api.query_max, 5);
    }

    #[test]
    fn test_sub_endpoint_falls_back_to_endpoint_params() {
        let params = vec![
            ParameterRow::new("financials", None, "statement", "bs"),
            ParameterRow::new("financials", None, "freq", "annual"),
        ];
        let tables = SettingsTables::new(base_settings(), params, vec![]);

        let config = tables
            .resolve("financials", Some("bs_annual"), &Overrides::new())
            .unwrap();

        let keys: Vec<&str> = config.params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["statement", "freq"]);
        assert_eq!(config.params["freq"], ParamValue::Text("annual".to_string()));
    }

    #[test]
    fn test_param_precedence_keeps_order() {
        let params = vec![
            ParameterRow::new("financials", None, "statement", "bs"),
            ParameterRow::new("financials", None, "freq", "annual"),
            ParameterRow::new("financials", Some("cf_quarterly"), "statement", "cf"),
            ParameterRow::new("financials", Some("cf_quarterly"), "freq", "quarterly"),
        ];
        let tables = SettingsTables::new(base_settings(), params, vec![]);

        let config = tables
            .resolve(
                "financials",
                Some("cf_quarterly"),
                &Overrides::new().param("freq", "ttm"),
            )
            .unwrap();

        let pairs: Vec<(String, String)> = config
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("statement".to_string(), "cf".to_string()),
                ("freq".to_string(), "ttm".to_string()),
            ]
        );
    }

    #[test]
    fn test_integer_params_are_typed() {
        let params = vec![ParameterRow::new("candle", None, "resolution", "D")];
        let tables = SettingsTables::new(base_settings(), params, vec![]);

        let config = tables
            .resolve("candle", None, &Overrides::new().param("from", 1_700_000_000_i64))
            .unwrap();
        assert_eq!(config.params["resolution"], ParamValue::Text("D".to_string()));
        assert_eq!(config.params["from"], ParamValue::Int(1_700_000_000));
    }

    #[test]
    fn test_data_keys_by_endpoint_only() {
        let keys = vec![
            DataKeyRow::new("financials", Some("financials"), Some("year")),
            DataKeyRow::new("eps-estimate", Some("data"), Some("period")),
        ];
        let tables = SettingsTables::new(base_settings(), vec![], keys);

        let config = tables
            .resolve("financials", Some("ic_quarterly"), &Overrides::new())
            .unwrap();
        assert_eq!(config.data_keys.data_json_key.as_deref(), Some("financials"));
        assert_eq!(config.data_keys.primary_key.as_deref(), Some("year"));
        assert_eq!(
            config.normalization,
            Normalization::Nested {
                key: "financials".to_string()
            }
        );

        let missing = tables.resolve("profile2", None, &Overrides::new()).unwrap();
        assert_eq!(missing.data_keys.data_json_key, None);
        assert_eq!(missing.data_keys.primary_key, None);
    }

    #[test]
    fn test_missing_required_setting() {
        let rows = vec![ApiSettingRow::new("default", None, "api_delay", "1")];
        let tables = SettingsTables::new(rows, vec![], vec![]);
        let err = tables.resolve("profile2", None, &Overrides::new()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(body.as_bytes()).unwrap();
        };
        write(
            API_SETTINGS_FILE,
            "endpoint,sub_endpoint,setting,value\n\
             default,,simultaneous_connections,2\n\
             default,,api_delay,1\n\
             default,,query_max,5\n\
             financials,bs_annual,api_delay,0.857\n",
        );
        write(
            ENDPOINT_PARAMETERS_FILE,
            "endpoint,sub_endpoint,parameter,value\n\
             financials,,statement,bs\n\
             financials,,freq,annual\n",
        );
        write(
            ENDPOINT_DATA_KEYS_FILE,
            "endpoint,data_json_key,primary_key\n\
             financials,financials,year\n\
             profile2,,\n",
        );

        let tables = SettingsTables::load(dir.path()).unwrap();
        let config = tables
            .resolve("financials", Some("bs_annual"), &Overrides::new())
            .unwrap();
        assert_eq!(config.api.api_delay, Duration::from_secs_f64(0.857));
        assert_eq!(config.params.len(), 2);
        assert_eq!(config.data_keys.primary_key.as_deref(), Some("year"));

        let profile = tables.resolve("profile2", None, &Overrides::new()).unwrap();
        assert_eq!(profile.data_keys, DataKeys::default());
    }

    #[test]
    fn test_load_missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = SettingsTables::load(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::SettingsLoad { .. }));
        assert!(err.is_fatal());
    }

    proptest! {
        #[test]
        fn prop_later_layer_wins(
            default in 1u32..100,
            endpoint in proptest::option::of(1u32..100),
            sub in proptest::option::of(1u32..100),
            caller in proptest::option::of(1u32..100),
        ) {
            let mut rows = vec![
                ApiSettingRow::new("default", None, "simultaneous_connections", "1"),
                ApiSettingRow::new("default", None, "api_delay", "0"),
                ApiSettingRow::new("default", None, "query_max", &default.to_string()),
            ];
            if let Some(v) = endpoint {
                rows.push(ApiSettingRow::new("candle", None, "query_max", &v.to_string()));
            }
            if let Some(v) = sub {
                rows.push(ApiSettingRow::new("candle", Some("weekly"), "query_max", &v.to_string()));
            }
            let mut overrides = Overrides::new();
            if let Some(v) = caller {
                overrides = overrides.setting("query_max", v);
            }

            let tables = SettingsTables::new(rows, vec![], vec![]);
            let config = tables.resolve("candle", Some("weekly"), &overrides).unwrap();

            let expected = caller.or(sub).or(endpoint).unwrap_or(default);
            prop_assert_eq!(config.api.query_max, expected);
        }
    }
}
