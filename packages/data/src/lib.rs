#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident data loading and caching for the dashboard.
//!
//! The dashboard pages never read the incident CSV themselves. They go
//! through an [`IncidentSource`], which hands out shared, already-cleaned
//! tables. [`DataManager`] is the CSV-backed source used by the server;
//! [`StaticSource`] wraps a fixed set of records.

pub mod loader;
pub mod manager;
pub mod paths;

use std::sync::Arc;

use crime_dashboard_data_models::{CacheInfo, IncidentFilter, IncidentRecord, Page};
use thiserror::Error;

pub use manager::DataManager;

/// File name of the Montreal incident export.
pub const INCIDENTS_FILE_NAME: &str = "actes-criminels.csv";

/// Errors that can occur while loading incident data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Reading the data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
}

/// Supplies cleaned incident tables to the dashboard pages.
pub trait IncidentSource: Send + Sync {
    /// Returns the incident table prepared for the given page.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the underlying data cannot be loaded.
    fn incidents(&self, page: Page) -> Result<Arc<Vec<IncidentRecord>>, DataError>;

    /// Returns the incidents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the underlying data cannot be loaded.
    fn filtered(&self, filter: &IncidentFilter) -> Result<Arc<Vec<IncidentRecord>>, DataError>;

    /// Drops memoized filter results.
    fn clear_cache(&self);

    /// Describes the current cache state.
    fn cache_info(&self) -> CacheInfo;
}

/// An [`IncidentSource`] over a fixed, in-memory set of records.
#[derive(Debug, Clone)]
pub struct StaticSource {
    records: Arc<Vec<IncidentRecord>>,
}

impl StaticSource {
    #[must_use]
    pub fn new(records: Vec<IncidentRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }
}

impl IncidentSource for StaticSource {
    fn incidents(&self, _page: Page) -> Result<Arc<Vec<IncidentRecord>>, DataError> {
        Ok(Arc::clone(&self.records))
    }

    fn filtered(&self, filter: &IncidentFilter) -> Result<Arc<Vec<IncidentRecord>>, DataError> {
        Ok(Arc::new(
            self.records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
        ))
    }

    fn clear_cache(&self) {}

    fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            filtered_cache_size: 0,
            data_loaded: true,
            row_count: Some(self.records.len()),
        }
    }
}
