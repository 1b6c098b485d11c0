//! Process-lifetime cache for the loaded table.
//!
//! The first `get` fetches and parses; every later call hands out the same
//! table. The cache is written once and only read afterwards, so it needs no
//! locking. Owners pass `&PriceTable` down to every aggregation call.

use std::cell::OnceCell;

use tracing::debug;

use crate::data::source::CsvSource;
use crate::domain::PriceTable;
use crate::error::AppError;
use crate::io::ingest::{IngestedTable, LoadSummary, parse_price_table};

pub struct DatasetCache {
    source: Box<dyn CsvSource>,
    loaded: OnceCell<IngestedTable>,
}

impl DatasetCache {
    pub fn new(source: Box<dyn CsvSource>) -> Self {
        Self {
            source,
            loaded: OnceCell::new(),
        }
    }

    /// The loaded table, fetching it on first use.
    ///
    /// A failed load is not cached: the error goes back to the caller and a
    /// later call tries again.
    pub fn get(&self) -> Result<&PriceTable, AppError> {
        Ok(&self.ingested()?.table)
    }

    /// Load statistics for the cached table.
    pub fn summary(&self) -> Result<&LoadSummary, AppError> {
        Ok(&self.ingested()?.summary)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    fn ingested(&self) -> Result<&IngestedTable, AppError> {
        if let Some(loaded) = self.loaded.get() {
            debug!("dataset cache hit");
            return Ok(loaded);
        }

        let text = self.source.read_csv()?;
        let ingested = parse_price_table(&text)?;
        Ok(self.loaded.get_or_init(|| ingested))
    }
}
