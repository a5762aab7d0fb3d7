//! Shared state for one collector run.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use fundlake_core::SettingsTables;
use fundlake_data::universe::{RemoteUniverseSource, UniverseBuilder, UniverseCache, UniverseSource};
use fundlake_data::{DatasetWriter, FinnhubClient, HttpTransport, JsonTransport};

use crate::config::CollectorConfig;
use crate::error::Result;

/// Settings tables, HTTP client and output writer, built once per run.
pub struct CollectorContext {
    pub config: CollectorConfig,
    pub tables: SettingsTables,
    pub client: FinnhubClient,
    pub writer: DatasetWriter,
    universe_source: Arc<dyn UniverseSource>,
}

impl CollectorContext {
    /// Load the settings tables and open the HTTP client. Missing tables are fatal.
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let tables = SettingsTables::load(config.app.config_dir())?;
        let transport = Arc::new(HttpTransport::new(Duration::from_secs(
            config.app.api.request_timeout_secs,
        ))?);
        Ok(Self::with_transport(config, tables, transport))
    }

    /// Assemble from parts; the universe is sourced through `transport` too.
    pub fn with_transport(
        config: CollectorConfig,
        tables: SettingsTables,
        transport: Arc<dyn JsonTransport>,
    ) -> Self {
        let client = FinnhubClient::new(
            transport,
            config.app.api.base_url.clone(),
            config.api_key.clone(),
        );
        let universe_source: Arc<dyn UniverseSource> = Arc::new(RemoteUniverseSource::new(
            client.clone(),
            config.app.api.symbol_exchange.clone(),
            config.app.universe.skip_rows,
        ));
        let writer = DatasetWriter::new(config.app.datasets_dir(), config.app.output.format);

        info!(
            data_dir = %config.app.data_dir.display(),
            format = %config.app.output.format,
            "Collector ready"
        );

        Self {
            config,
            tables,
            client,
            writer,
            universe_source,
        }
    }

    /// Replace the universe source (tests, offline runs).
    pub fn with_universe_source(mut self, source: Arc<dyn UniverseSource>) -> Self {
        self.universe_source = source;
        self
    }

    pub fn universe_builder(&self) -> UniverseBuilder {
        UniverseBuilder::new(
            self.config.app.universe.clone(),
            Arc::clone(&self.universe_source),
        )
    }

    pub fn universe_cache(&self) -> UniverseCache {
        UniverseCache::in_dir(self.config.app.datasets_dir())
    }

    /// Writer for a run that overrides the configured output format.
    pub fn writer_for(&self, format: Option<fundlake_core::OutputFormat>) -> DatasetWriter {
        match format {
            Some(format) => DatasetWriter::new(self.config.app.datasets_dir(), format),
            None => self.writer.clone(),
        }
    }
}
