//! Same-day universe cache.
//!
//! The universe CSV is reused when its modification date (local time) is
//! today; otherwise it is rebuilt and overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info};

use crate::error::{DataError, Result};
use crate::universe::{Universe, UniverseBuilder, UniverseEntry};

/// Cache file name inside the datasets folder.
pub const UNIVERSE_FILE: &str = "finnhub_investable_universe.csv";

const TICKER_HEADER: &str = "Ticker";
const INDEX_PREFIX: &str = "in_";

/// Universe CSV on disk.
#[derive(Debug, Clone)]
pub struct UniverseCache {
    path: PathBuf,
}

impl UniverseCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at `<datasets_dir>/finnhub_investable_universe.csv`.
    pub fn in_dir(datasets_dir: impl AsRef<Path>) -> Self {
        Self::new(datasets_dir.as_ref().join(UNIVERSE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Local date of the last write, if the file exists.
    pub fn modified_on(&self) -> Result<Option<NaiveDate>> {
        match fs::metadata(&self.path) {
            Ok(meta) => {
                let modified: DateTime<Local> = meta.modified()?.into();
                Ok(Some(modified.date_naive()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The cached universe if it was written on `today`.
    pub fn load_if_fresh(&self, today: NaiveDate) -> Result<Option<Universe>> {
        match self.modified_on()? {
            Some(date) if date == today => self.load().map(Some),
            Some(date) => {
                debug!(path = %self.path.display(), %date, "Universe cache is stale");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn load(&self) -> Result<Universe> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();

        if headers.get(0) != Some(TICKER_HEADER) {
            return Err(DataError::InvalidData(format!(
                "{}: first column must be '{}'",
                self.path.display(),
                TICKER_HEADER
            )));
        }
        let index_names: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|h| h.strip_prefix(INDEX_PREFIX).unwrap_or(h).to_string())
            .collect();

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let ticker = record.get(0).unwrap_or_default().to_string();
            let memberships = record
                .iter()
                .skip(1)
                .map(|v| {
                    v.trim().parse::<u32>().map_err(|e| {
                        DataError::InvalidData(format!("{}: bad count '{}': {}", ticker, v, e))
                    })
                })
                .collect::<Result<Vec<u32>>>()?;
            entries.push(UniverseEntry {
                ticker,
                memberships,
            });
        }

        Universe::new(index_names, entries)
    }

    pub fn store(&self, universe: &Universe) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        let mut header = vec![TICKER_HEADER.to_string()];
        header.extend(
            universe
                .index_names()
                .iter()
                .map(|n| format!("{}{}", INDEX_PREFIX, n)),
        );
        writer.write_record(&header)?;

        for entry in universe.entries() {
            let mut row = vec![entry.ticker.clone()];
            row.extend(entry.memberships.iter().map(u32::to_string));
            writer.write_record(&row)?;
        }
        writer.flush()?;

        info!(path = %self.path.display(), tickers = universe.len(), "Universe saved");
        Ok(())
    }
}

/// Reuse today's cache unless `refresh` is set; otherwise build and store.
pub async fn load_or_build(
    builder: &UniverseBuilder,
    cache: &UniverseCache,
    refresh: bool,
) -> Result<Universe> {
    if !refresh {
        if let Some(universe) = cache.load_if_fresh(Local::now().date_naive())? {
            info!(
                path = %cache.path().display(),
                tickers = universe.len(),
                "Using today's universe cache"
            );
            return Ok(universe);
        }
    }

    info!(refresh, "Building investable universe");
    let universe = builder.build().await?;
    cache.store(&universe)?;
    Ok(universe)
}
