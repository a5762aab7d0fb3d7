//! Logging infrastructure built on tracing.
//!
//! Console output comes in three formats:
//! - **pretty**: human-readable, for development
//! - **json**: one JSON object per event, for log aggregation
//! - **compact**: single-line
//!
//! An optional log file receives the same events without ANSI colors.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// Console log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, multi-line
    #[default]
    Pretty,
    /// JSON
    Json,
    /// Single-line
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logging setup.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level filter (e.g. "info", "fundlake_data=debug")
    pub level: String,
    /// Console format
    pub format: LogFormat,
    /// Log file written alongside the console
    pub file: Option<PathBuf>,
    /// Emit span enter/exit events
    pub with_span_events: bool,
    /// Include file name and line number
    pub with_file: bool,
    /// Include module path
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
            with_span_events: false,
            with_file: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_output(mut self, path: Option<PathBuf>) -> Self {
        self.file = path;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// Build from the `[logging]` config section. Unknown formats fall back to pretty.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.level.clone())
            .with_format(config.format.parse().unwrap_or_default())
            .with_file_output(config.file.clone())
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. When a log file is
/// configured the returned guard must be held until exit so buffered
/// lines are flushed.
///
/// # Example
///
/// ```no_run
/// use fundlake_core::logging::{init_logging, LogConfig, LogFormat};
///
/// let _guard = init_logging(LogConfig::new("debug").with_format(LogFormat::Compact)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.with_file)
        .with_line_number(config.with_file)
        .with_target(config.with_target)
        .with_span_events(span_events);
    layers.push(match config.format {
        LogFormat::Pretty => console.pretty().boxed(),
        LogFormat::Json => console.json().boxed(),
        LogFormat::Compact => console.compact().boxed(),
    });

    let guard = match &config.file {
        Some(path) => {
            let (dir, name) = split_log_path(path);
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(config.with_target)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    tracing::info!(
        format = ?config.format,
        level = %config.level,
        file = ?config.file,
        "Logging initialized"
    );

    Ok(guard)
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fundlake.log"));
    (dir, name)
}

/// Span carrying endpoint and ticker context for one fetch.
#[macro_export]
macro_rules! fetch_span {
    ($endpoint:expr, $ticker:expr) => {
        tracing::debug_span!("fetch", endpoint = %$endpoint, ticker = %$ticker)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("invalid".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_config_from_section() {
        let section = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
            file: None,
        };
        let config = LogConfig::from_config(&section).with_span_events(true);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.with_span_events);
        assert_eq!(config.file, None);

        let fallback = LogConfig::from_config(&LoggingConfig {
            format: "fancy".to_string(),
            ..LoggingConfig::default()
        });
        assert_eq!(fallback.format, LogFormat::Pretty);
        assert_eq!(fallback.file, Some(PathBuf::from("finnhub.log")));
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("finnhub.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("finnhub.log"));

        let (dir, name) = split_log_path(Path::new("logs/run.log"));
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(name, PathBuf::from("run.log"));
    }
}
