//! CSV-backed incident source with in-process caching.
//!
//! The incident table is read once, on first access, and shared by every
//! page for the life of the process. Filtered views are memoized per
//! [`IncidentFilter`] in a small bounded cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crime_dashboard_data_models::{CacheInfo, IncidentFilter, IncidentRecord, Page};

use crate::{DataError, INCIDENTS_FILE_NAME, IncidentSource, loader, paths};

/// Maximum number of memoized filter results.
const FILTERED_CACHE_CAPACITY: usize = 32;

type Table = Arc<Vec<IncidentRecord>>;

/// Filter results keyed by filter, tagged with an insertion sequence so the
/// oldest entry can be evicted.
///
/// `generation` advances on every clear; results computed under an older
/// generation are discarded instead of stored.
#[derive(Default)]
struct FilteredCache {
    entries: BTreeMap<IncidentFilter, (u64, Table)>,
    next_seq: u64,
    generation: u64,
}

impl FilteredCache {
    fn get(&self, filter: &IncidentFilter) -> Option<Table> {
        self.entries.get(filter).map(|(_, t)| Arc::clone(t))
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    /// Stores `table` unless the cache was cleared since `generation` was
    /// read. Returns whether it was stored.
    fn insert_if_current(&mut self, generation: u64, filter: IncidentFilter, table: Table) -> bool {
        if generation != self.generation {
            return false;
        }
        self.insert(filter, table);
        true
    }

    fn insert(&mut self, filter: IncidentFilter, table: Table) {
        if self.entries.len() >= FILTERED_CACHE_CAPACITY
            && !self.entries.contains_key(&filter)
            && let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (seq, _))| *seq)
                .map(|(k, _)| *k)
        {
            self.entries.remove(&oldest);
        }
        self.entries.insert(filter, (self.next_seq, table));
        self.next_seq += 1;
    }
}

/// Loads the incident CSV lazily and caches it for the process lifetime.
///
/// `loading` serializes reads of the file; `table` is only ever held long
/// enough to swap an `Arc`, so status queries never wait on a load.
pub struct DataManager {
    path: PathBuf,
    loading: Mutex<()>,
    table: Mutex<Option<Table>>,
    filtered: Mutex<FilteredCache>,
}

impl DataManager {
    /// Creates a manager reading from an explicit CSV path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        log::info!("DataManager using {}", path.display());
        Self {
            path,
            loading: Mutex::new(()),
            table: Mutex::new(None),
            filtered: Mutex::new(FilteredCache::default()),
        }
    }

    /// Creates a manager for `configured`, or for the first known location
    /// of the incident CSV when no path is configured.
    #[must_use]
    pub fn discover(configured: Option<&Path>) -> Self {
        Self::new(paths::configured_or_resolved(
            configured,
            INCIDENTS_FILE_NAME,
        ))
    }

    /// Path of the CSV file backing this manager.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current(&self) -> Option<Table> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, loaded: &Table) {
        *self.table.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(loaded));
    }

    /// Returns the incident table, loading it on first use.
    ///
    /// Concurrent first callers wait on the load lock for a single read
    /// instead of each parsing the file.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the CSV can't be read.
    pub fn load(&self) -> Result<Table, DataError> {
        if let Some(loaded) = self.current() {
            return Ok(loaded);
        }

        let _loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(loaded) = self.current() {
            return Ok(loaded);
        }
        let loaded = Arc::new(loader::load_incidents(&self.path)?);
        self.store(&loaded);
        Ok(loaded)
    }

    /// Re-reads the CSV, replacing the cached table and dropping filter
    /// results computed from the old one.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the CSV can't be read. The previous table
    /// stays cached in that case.
    pub fn reload(&self) -> Result<Table, DataError> {
        let loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
        let loaded = Arc::new(loader::load_incidents(&self.path)?);
        self.store(&loaded);
        drop(loading);
        self.clear_cache();
        Ok(loaded)
    }
}

impl IncidentSource for DataManager {
    fn incidents(&self, page: Page) -> Result<Table, DataError> {
        log::debug!("Serving incident table for {page} page");
        self.load()
    }

    fn filtered(&self, filter: &IncidentFilter) -> Result<Table, DataError> {
        let generation = {
            let cache = self.filtered.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(filter) {
                log::debug!("Filtered data cache hit: {filter:?}");
                return Ok(hit);
            }
            cache.generation
        };

        let table = self.load()?;
        let rows: Table = Arc::new(table.iter().filter(|r| filter.matches(r)).cloned().collect());

        let stored = self
            .filtered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_if_current(generation, *filter, Arc::clone(&rows));
        if stored {
            log::debug!("Filtered data cached: {filter:?} ({} rows)", rows.len());
        } else {
            log::debug!("Cache cleared while filtering {filter:?}, result not stored");
        }
        Ok(rows)
    }

    fn clear_cache(&self) {
        self.filtered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        log::info!("Data cache cleared");
    }

    fn cache_info(&self) -> CacheInfo {
        let table = self.current();
        let filtered_cache_size = self
            .filtered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len();
        CacheInfo {
            filtered_cache_size,
            data_loaded: table.is_some(),
            row_count: table.as_ref().map(|t| t.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
CATEGORIE,DATE,QUART,PDQ,LONGITUDE,LATITUDE
Méfait,2017-03-01,jour,38,-73.58,45.52
Vols qualifiés,2018-07-14,nuit,38,-73.57,45.53
Introduction,2019-10-02,soir,21,-73.56,45.50
";

    struct Fixture {
        dir: PathBuf,
        csv: PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "crime-dashboard-manager-{name}-{}",
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            let csv = dir.join(INCIDENTS_FILE_NAME);
            std::fs::write(&csv, SAMPLE).unwrap();
            Self { dir, csv }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[test]
    fn loads_once_and_shares_table() {
        let fixture = Fixture::new("shares");
        let manager = DataManager::new(&fixture.csv);
        assert!(!manager.cache_info().data_loaded);

        let first = manager.incidents(Page::Timeline).unwrap();
        let second = manager.incidents(Page::Map).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cache_info().row_count, Some(3));
    }

    #[test]
    fn filtered_results_are_memoized() {
        let fixture = Fixture::new("memo");
        let manager = DataManager::new(&fixture.csv);
        let filter = IncidentFilter {
            pdq: Some(38),
            ..IncidentFilter::default()
        };

        let first = manager.filtered(&filter).unwrap();
        let second = manager.filtered(&filter).unwrap();
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cache_info().filtered_cache_size, 1);

        manager.clear_cache();
        assert_eq!(manager.cache_info().filtered_cache_size, 0);
        assert!(manager.cache_info().data_loaded);
    }

    #[test]
    fn filtered_cache_is_bounded() {
        let fixture = Fixture::new("bounded");
        let manager = DataManager::new(&fixture.csv);
        for year in 0..40 {
            let filter = IncidentFilter {
                start_year: Some(2000 + year),
                ..IncidentFilter::default()
            };
            manager.filtered(&filter).unwrap();
        }
        assert_eq!(
            manager.cache_info().filtered_cache_size,
            FILTERED_CACHE_CAPACITY
        );
    }

    #[test]
    fn reload_replaces_table() {
        let fixture = Fixture::new("reload");
        let manager = DataManager::new(&fixture.csv);
        let first = manager.load().unwrap();
        let reloaded = manager.reload().unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(*first, *reloaded);
    }

    #[test]
    fn cache_info_does_not_wait_for_a_load() {
        let fixture = Fixture::new("info-during-load");
        let manager = Arc::new(DataManager::new(&fixture.csv));
        let loading = manager.loading.lock().unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let reader = Arc::clone(&manager);
        std::thread::spawn(move || tx.send(reader.cache_info()).unwrap());

        let info = rx
            .recv_timeout(std::time::Duration::from_millis(500))
            .expect("cache_info blocked behind the load lock");
        assert!(!info.data_loaded);
        drop(loading);
    }

    #[test]
    fn results_from_before_a_clear_are_not_stored() {
        let mut cache = FilteredCache::default();
        let filter = IncidentFilter {
            pdq: Some(38),
            ..IncidentFilter::default()
        };

        let before = cache.generation;
        cache.clear();
        assert!(!cache.insert_if_current(before, filter, Arc::new(Vec::new())));
        assert!(cache.get(&filter).is_none());

        assert!(cache.insert_if_current(cache.generation, filter, Arc::new(Vec::new())));
        assert!(cache.get(&filter).is_some());
    }

    #[test]
    fn reload_invalidates_filtered_results() {
        let fixture = Fixture::new("reload-filtered");
        let manager = DataManager::new(&fixture.csv);
        let filter = IncidentFilter::default();

        let before = manager.filtered(&filter).unwrap();
        manager.reload().unwrap();
        let after = manager.filtered(&filter).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(manager.cache_info().filtered_cache_size, 1);
    }

    #[test]
    fn missing_file_propagates_error() {
        let manager = DataManager::new("/nonexistent/actes-criminels.csv");
        assert!(manager.incidents(Page::Map).is_err());
        assert!(!manager.cache_info().data_loaded);
    }
}
