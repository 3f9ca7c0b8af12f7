#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime map pipeline.
//!
//! Incidents are filtered to the city bounds, attributed to a district with
//! a point-in-polygon join, thinned to a handful of markers per district,
//! and drawn over the district boundaries. The joined table is expensive to
//! build, so [`MapService`] computes it once and keeps it in a
//! [`ProcessedCache`] until explicitly invalidated.

pub mod cache;
pub mod pipeline;
pub mod reduce;
pub mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crime_dashboard_data::{DataError, IncidentSource, paths};
use crime_dashboard_figure_models::Figure;
use crime_dashboard_map_models::{
    MAX_POINTS_PER_DISTRICT, MIN_POINTS_PER_DISTRICT, ReducedPoint, ReductionStrategy,
};
use crime_dashboard_spatial::{DISTRICTS_FILE_NAME, SpatialError};
use thiserror::Error;

pub use cache::ProcessedCache;
pub use pipeline::ProcessedData;

/// Errors that can occur while building the crime map.
#[derive(Debug, Error)]
pub enum MapError {
    /// Loading incidents failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Loading district boundaries failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// The boundary collection could not be re-encoded for rendering.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested points-per-district limit is out of range.
    #[error(
        "maxPoints must be between {MIN_POINTS_PER_DISTRICT} and {MAX_POINTS_PER_DISTRICT}, got {value}"
    )]
    InvalidPointLimit {
        /// The rejected value.
        value: usize,
    },
}

/// Checks a points-per-district limit against the accepted range.
///
/// # Errors
///
/// Returns [`MapError::InvalidPointLimit`] if `k` is outside
/// `MIN_POINTS_PER_DISTRICT..=MAX_POINTS_PER_DISTRICT`.
pub const fn validate_point_limit(k: usize) -> Result<usize, MapError> {
    if k < MIN_POINTS_PER_DISTRICT || k > MAX_POINTS_PER_DISTRICT {
        return Err(MapError::InvalidPointLimit { value: k });
    }
    Ok(k)
}

fn reduce_snapshot(data: &ProcessedData, strategy: ReductionStrategy, k: usize) -> Vec<ReducedPoint> {
    let points = reduce::reduce(strategy, &data.joined, k);
    log::debug!(
        "Reduced from {} to {} points ({strategy}, k={k})",
        data.joined.len(),
        points.len()
    );
    points
}

/// Reduces and renders one snapshot of the joined table, so the markers and
/// the base layer always come from the same data.
fn figure_from(data: &ProcessedData, strategy: ReductionStrategy, k: usize) -> Figure {
    let points = reduce_snapshot(data, strategy, k);
    render::render_map(data, &points, strategy, k)
}

/// Builds crime map figures from an incident source and a boundary file.
pub struct MapService {
    source: Arc<dyn IncidentSource>,
    geometry_path: PathBuf,
    cache: ProcessedCache<ProcessedData>,
}

impl MapService {
    #[must_use]
    pub fn new(source: Arc<dyn IncidentSource>, geometry_path: impl Into<PathBuf>) -> Self {
        let geometry_path = geometry_path.into();
        log::info!("MapService using districts {}", geometry_path.display());
        Self {
            source,
            geometry_path,
            cache: ProcessedCache::new(),
        }
    }

    /// Creates a service for `configured`, or for the first known location
    /// of the district boundary file when no path is configured.
    #[must_use]
    pub fn discover(source: Arc<dyn IncidentSource>, configured: Option<&Path>) -> Self {
        Self::new(
            source,
            paths::configured_or_resolved(configured, DISTRICTS_FILE_NAME),
        )
    }

    #[must_use]
    pub fn geometry_path(&self) -> &Path {
        &self.geometry_path
    }

    /// Returns the joined incident table, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the incidents or the boundaries can't be
    /// loaded. Nothing is cached in that case.
    pub fn processed(&self) -> Result<Arc<ProcessedData>, MapError> {
        self.cache.get_or_compute(|| {
            pipeline::load_and_process(self.source.as_ref(), &self.geometry_path)
        })
    }

    /// Thins the joined incidents to at most `k` points per district.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if `k` is out of range or the joined table
    /// can't be built.
    pub fn reduce(
        &self,
        strategy: ReductionStrategy,
        k: usize,
    ) -> Result<Vec<ReducedPoint>, MapError> {
        let k = validate_point_limit(k)?;
        let data = self.processed()?;
        Ok(reduce_snapshot(&data, strategy, k))
    }

    /// Builds the map figure for `strategy` with `k` points per district.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if `k` is out of range or the joined table
    /// can't be built.
    pub fn create_map_figure(
        &self,
        strategy: ReductionStrategy,
        k: usize,
    ) -> Result<Figure, MapError> {
        log::info!("Creating map with {strategy}, max {k} points per district");
        let k = validate_point_limit(k)?;
        let data = self.processed()?;
        Ok(figure_from(&data, strategy, k))
    }

    /// Whether the joined table is currently cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.is_cached()
    }

    /// Drops the joined table and the source's filtered results.
    pub fn clear_cache(&self) {
        self.cache.invalidate();
        self.source.clear_cache();
        log::info!("Map cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_dashboard_crime_models::CrimeCategory;
    use crime_dashboard_data::StaticSource;
    use crime_dashboard_data_models::IncidentRecord;
    use crime_dashboard_figure_models::Trace;

    use super::*;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NOM": "Plateau" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-73.60, 45.50], [-73.55, 45.50], [-73.55, 45.55], [-73.60, 45.55], [-73.60, 45.50]]]
                }
            }
        ]
    }"#;

    struct Fixture {
        dir: PathBuf,
        geometry: PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "crime-dashboard-map-{name}-{}",
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            let geometry = dir.join(DISTRICTS_FILE_NAME);
            std::fs::write(&geometry, DISTRICTS).unwrap();
            Self { dir, geometry }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn source() -> Arc<dyn IncidentSource> {
        let record = |category, lng, lat| IncidentRecord {
            date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
            category,
            time_of_day: None,
            pdq: Some(38),
            longitude: Some(lng),
            latitude: Some(lat),
        };
        Arc::new(StaticSource::new(vec![
            record(CrimeCategory::Mischief, -73.57, 45.52),
            record(CrimeCategory::Mischief, -73.58, 45.53),
            record(CrimeCategory::Robbery, -73.56, 45.51),
            record(CrimeCategory::Other, -73.57, 45.52),
        ]))
    }

    #[test]
    fn builds_map_figure() {
        let fixture = Fixture::new("figure");
        let service = MapService::new(source(), &fixture.geometry);

        let figure = service
            .create_map_figure(ReductionStrategy::RepresentativeByType, 3)
            .unwrap();

        // Base layer, then Mischief and Robbery; Other is never drawn.
        assert_eq!(figure.data.len(), 3);
        assert!(matches!(figure.data[0], Trace::Choroplethmapbox(_)));
        assert!(service.is_cached());
    }

    #[test]
    fn figure_is_drawn_from_a_single_snapshot() {
        let fixture = Fixture::new("snapshot");
        let service = MapService::new(source(), &fixture.geometry);

        let data = service.processed().unwrap();
        service.clear_cache();

        let figure = figure_from(&data, ReductionStrategy::RepresentativeByType, 3);
        assert!(!service.is_cached());
        assert_eq!(
            figure,
            service
                .create_map_figure(ReductionStrategy::RepresentativeByType, 3)
                .unwrap()
        );
    }

    #[test]
    fn joined_table_is_computed_once_until_cleared() {
        let fixture = Fixture::new("cache");
        let service = MapService::new(source(), &fixture.geometry);

        let first = service.processed().unwrap();
        let second = service.processed().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        service.clear_cache();
        assert!(!service.is_cached());
        let third = service.processed().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first.joined, third.joined);
    }

    #[test]
    fn rejects_out_of_range_limit() {
        let fixture = Fixture::new("limit");
        let service = MapService::new(source(), &fixture.geometry);
        assert!(matches!(
            service.reduce(ReductionStrategy::Hotspot, 0),
            Err(MapError::InvalidPointLimit { value: 0 })
        ));
        assert!(matches!(
            service.reduce(ReductionStrategy::Hotspot, 6),
            Err(MapError::InvalidPointLimit { value: 6 })
        ));
        assert!(!service.is_cached());
    }

    #[test]
    fn missing_geometry_is_not_cached() {
        let service = MapService::new(source(), "/nonexistent/montreal.json");
        assert!(matches!(
            service.processed(),
            Err(MapError::Spatial(SpatialError::Io(_)))
        ));
        assert!(!service.is_cached());
    }
}
