//! Application configuration.
//!
//! Built in layers: compiled defaults, then an optional TOML file, then
//! `FUNDLAKE_*` environment variables (`__` separates nested keys, e.g.
//! `FUNDLAKE_API__REQUEST_TIMEOUT_SECS=20`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/fundlake.toml";

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Root folder; settings tables and datasets live below it
    pub data_dir: PathBuf,
    /// Settings tables folder, `<data_dir>/configs` when unset
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
    /// Finnhub API settings
    pub api: ApiConfig,
    /// Investable universe settings
    pub universe: UniverseConfig,
    /// Output settings
    pub output: OutputConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("finnhub"),
            config_dir: None,
            api: ApiConfig::default(),
            universe: UniverseConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Finnhub API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// REST base URL
    pub base_url: String,
    /// Exchange code for the symbol directory
    pub symbol_exchange: String,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://finnhub.io/api/v1".to_string(),
            symbol_exchange: "US".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// One index fund whose holdings contribute to the universe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndexFund {
    /// Short index name, used for the `in_<name>` column
    pub name: String,
    /// Holdings CSV download URL
    pub url: String,
}

impl IndexFund {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Investable universe settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseConfig {
    /// Index funds, in column order
    pub index_funds: Vec<IndexFund>,
    /// Accepted values of the holdings `Exchange` column
    pub exchanges: Vec<String>,
    /// Tickers added regardless of index membership
    pub extra_tickers: Vec<String>,
    /// Preamble lines before the holdings header row
    pub skip_rows: usize,
    /// Drop tickers containing non-alphabetic characters
    pub require_alphabetic: bool,
    /// Shuffle the ticker list before a full fetch
    pub shuffle_tickers: bool,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let ishares = |product: &str, slug: &str, fund: &str| {
            format!(
                "https://www.ishares.com/us/products/{}/{}/1467271812596.ajax?fileType=csv&fileName={}_holdings&dataType=fund",
                product, slug, fund
            )
        };

        Self {
            index_funds: vec![
                IndexFund::new("r1000", ishares("239707", "ishares-russell-1000-etf", "IWB")),
                IndexFund::new("r2000", ishares("239710", "ishares-russell-2000-etf", "IWM")),
                IndexFund::new("r3000", ishares("239714", "ishares-russell-3000-etf", "IWV")),
                IndexFund::new("sp500", ishares("239726", "ishares-core-sp-500-etf", "IVV")),
            ],
            exchanges: vec![
                "NASDAQ".to_string(),
                "New York Stock Exchange Inc.".to_string(),
                "Nyse Mkt Llc".to_string(),
                "Cboe BZX formerly known as BATS".to_string(),
            ],
            extra_tickers: ["HBB", "MMYT", "TGLS", "CYRX", "PROF", "EVLV"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            skip_rows: 9,
            require_alphabetic: true,
            shuffle_tickers: true,
        }
    }
}

/// Dataset file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One CSV file per dataset
    #[default]
    Csv,
    /// One JSON line per record, one file per day
    Jsonl,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" => Ok(Self::Jsonl),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Dataset file format
    pub format: OutputFormat,
    /// Write one CSV row per API attempt
    pub record_api_calls: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Log format (pretty, json, compact)
    pub format: String,
    /// Optional log file, written in addition to stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: Some(PathBuf::from("finnhub.log")),
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` (if given and present), then the environment.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("FUNDLAKE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Load from [`DEFAULT_CONFIG_PATH`].
    pub fn load_default() -> CoreResult<Self> {
        Self::load(Some(Path::new(DEFAULT_CONFIG_PATH)))
    }

    fn validate(&self) -> CoreResult<()> {
        if self.api.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "api.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.universe.index_funds.is_empty() {
            return Err(CoreError::Config(
                "universe.index_funds must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Folder holding the three settings tables.
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("configs"))
    }

    /// Folder for dataset outputs and the universe cache.
    pub fn datasets_dir(&self) -> PathBuf {
        self.data_dir.join("datasets")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.universe.skip_rows, 9);
        assert_eq!(config.universe.index_funds.len(), 4);
        assert_eq!(config.universe.index_funds[3].name, "sp500");
        assert!(config.universe.index_funds[0].url.contains("IWB_holdings"));
        assert_eq!(config.config_dir(), PathBuf::from("finnhub/configs"));
        assert_eq!(config.datasets_dir(), PathBuf::from("finnhub/datasets"));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(Some(Path::new("does/not/exist.toml"))).unwrap();
        assert_eq!(config.api.base_url, "https://finnhub.io/api/v1");
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fundlake.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "data_dir = \"/tmp/fl\"\n\n[api]\nrequest_timeout_secs = 30\n\n[output]\nformat = \"jsonl\"\nrecord_api_calls = true"
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fl"));
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.api.symbol_exchange, "US");
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert!(config.output.record_api_calls);
        assert_eq!(config.universe.extra_tickers.len(), 6);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert!("parquet".parse::<OutputFormat>().is_err());
    }
}
