//! Incident loading and the district spatial join.

use std::collections::HashSet;
use std::path::Path;

use crime_dashboard_data::IncidentSource;
use crime_dashboard_data_models::{IncidentRecord, Page};
use crime_dashboard_map_models::JoinedIncident;
use crime_dashboard_spatial::{DistrictGeometry, DistrictIndex, MONTREAL_BOUNDS};

use crate::MapError;

/// Everything the map needs that doesn't depend on the request.
pub struct ProcessedData {
    /// Boundaries and their index.
    pub geometry: DistrictGeometry,
    /// Boundary collection encoded once for the base map layer.
    pub base_geojson: serde_json::Value,
    /// Incidents inside the city bounds, in source order.
    pub joined: Vec<JoinedIncident>,
    /// Distinct matched districts in order of first appearance.
    pub districts: Vec<String>,
}

/// Loads the boundaries at `geometry_path` and joins the map incidents
/// against them.
///
/// # Errors
///
/// Returns [`MapError`] if either input can't be loaded.
pub fn load_and_process(
    source: &dyn IncidentSource,
    geometry_path: &Path,
) -> Result<ProcessedData, MapError> {
    log::info!("Loading map data for the first time");
    let geometry = DistrictGeometry::load(geometry_path)?;
    let data = process(source, geometry)?;
    log::info!(
        "Map data processed and cached: {} crime records in {} districts",
        data.joined.len(),
        data.districts.len()
    );
    Ok(data)
}

/// Joins the map incidents of `source` against already loaded boundaries.
///
/// # Errors
///
/// Returns [`MapError`] if the incidents can't be loaded.
pub fn process(
    source: &dyn IncidentSource,
    geometry: DistrictGeometry,
) -> Result<ProcessedData, MapError> {
    let incidents = source.incidents(Page::Map)?;
    let joined = join_incidents(&incidents, &geometry.index);
    let districts = distinct_districts(&joined);
    let base_geojson = serde_json::to_value(&geometry.collection)?;

    Ok(ProcessedData {
        geometry,
        base_geojson,
        joined,
        districts,
    })
}

/// Keeps incidents with coordinates strictly inside the city bounds and
/// tags each with the district containing it.
///
/// Every retained incident yields exactly one row; incidents outside all
/// districts keep a `None` district.
#[must_use]
pub fn join_incidents(records: &[IncidentRecord], index: &DistrictIndex) -> Vec<JoinedIncident> {
    let joined = records
        .iter()
        .filter_map(|record| {
            let (longitude, latitude) = record.coordinates()?;
            MONTREAL_BOUNDS
                .contains(longitude, latitude)
                .then(|| JoinedIncident {
                    category: record.category,
                    longitude,
                    latitude,
                    pdq: record.pdq,
                    district: index.lookup(longitude, latitude).map(str::to_string),
                })
        })
        .collect::<Vec<_>>();

    let unmatched = joined.iter().filter(|j| j.district.is_none()).count();
    if unmatched > 0 {
        log::debug!("{unmatched} incidents fall outside every district");
    }

    joined
}

/// Distinct non-null districts in order of first appearance.
#[must_use]
pub fn distinct_districts(joined: &[JoinedIncident]) -> Vec<String> {
    let mut seen = HashSet::new();
    joined
        .iter()
        .filter_map(|j| j.district.as_deref())
        .filter(|d| seen.insert(*d))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_dashboard_crime_models::CrimeCategory;
    use crime_dashboard_data::StaticSource;

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
            },
            {
                "type": "Feature",
                "properties": { "NOM": "Verdun" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-73.55, 45.45], [-73.50, 45.45], [-73.50, 45.50], [-73.55, 45.50], [-73.55, 45.45]]]
                }
            }
        ]
    }"#;

    fn record(lng: Option<f64>, lat: Option<f64>) -> IncidentRecord {
        IncidentRecord {
            date: NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
            category: CrimeCategory::Mischief,
            time_of_day: None,
            pdq: None,
            longitude: lng,
            latitude: lat,
        }
    }

    #[test]
    fn joins_each_incident_once() {
        let geometry = DistrictGeometry::parse(DISTRICTS).unwrap();
        let records = vec![
            record(Some(-73.52), Some(45.47)),
            record(Some(-73.57), Some(45.52)),
            record(Some(-73.70), Some(45.60)),
            record(Some(-73.58), Some(45.53)),
        ];

        let joined = join_incidents(&records, &geometry.index);
        let districts = joined
            .iter()
            .map(|j| j.district.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(
            districts,
            [Some("Verdun"), Some("Plateau"), None, Some("Plateau")]
        );
        assert_eq!(distinct_districts(&joined), ["Verdun", "Plateau"]);
    }

    #[test]
    fn drops_missing_and_out_of_bounds_coordinates() {
        let geometry = DistrictGeometry::parse(DISTRICTS).unwrap();
        let records = vec![
            record(None, Some(45.52)),
            record(Some(-73.57), None),
            record(Some(0.0), Some(0.0)),
            record(Some(-73.57), Some(45.70)),
            record(Some(-73.40), Some(45.52)),
            record(Some(-73.57), Some(45.52)),
        ];

        let joined = join_incidents(&records, &geometry.index);
        assert_eq!(joined.len(), 1);
        assert!(
            joined
                .iter()
                .all(|j| MONTREAL_BOUNDS.contains(j.longitude, j.latitude))
        );
    }

    #[test]
    fn process_encodes_base_layer() {
        let geometry = DistrictGeometry::parse(DISTRICTS).unwrap();
        let source = StaticSource::new(vec![record(Some(-73.57), Some(45.52))]);

        let data = process(&source, geometry).unwrap();
        assert_eq!(data.base_geojson["type"], "FeatureCollection");
        assert_eq!(data.base_geojson["features"][1]["properties"]["NOM"], "Verdun");
        assert_eq!(data.districts, ["Plateau"]);
    }
}
