#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record, filter, and cache status types.
//!
//! These are the shapes handed out by the incident data source. Records
//! are cleaned and typed at load time; the derived calendar fields are
//! computed on demand from the incident date.

use chrono::{Datelike as _, NaiveDate};
use crime_dashboard_crime_models::{CrimeCategory, DayType, Season, TimeOfDay};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single cleaned incident from the police dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Date the incident was reported.
    pub date: NaiveDate,
    /// Normalized incident category.
    pub category: CrimeCategory,
    /// Patrol shift, when the source value is recognized.
    pub time_of_day: Option<TimeOfDay>,
    /// Neighborhood police station number (PDQ).
    pub pdq: Option<u16>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
}

impl IncidentRecord {
    #[must_use]
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    #[must_use]
    pub fn season(&self) -> Season {
        Season::from_month(self.month())
    }

    #[must_use]
    pub fn day_type(&self) -> DayType {
        DayType::from_weekday(self.date.weekday())
    }

    /// Returns `(longitude, latitude)` when both coordinates are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.longitude?, self.latitude?))
    }
}

/// Dashboard pages that request incident data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Page {
    /// Crime counts over years, seasons, or months.
    Timeline,
    /// Time of day, day type, and night-time trend charts.
    Temporal,
    /// District crime map.
    Map,
    /// Police station by year scatter plot.
    Scatter,
    /// Category by period heatmaps.
    Heatmap,
}

/// Filter applied to the incident table. Also serves as the cache key
/// for filtered results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentFilter {
    /// First year to include (inclusive).
    pub start_year: Option<i32>,
    /// Last year to include (inclusive).
    pub end_year: Option<i32>,
    /// Only incidents handled by this station.
    pub pdq: Option<u16>,
    /// Only incidents of this category.
    pub category: Option<CrimeCategory>,
}

impl IncidentFilter {
    /// Returns `true` if the record passes every active filter.
    #[must_use]
    pub fn matches(&self, record: &IncidentRecord) -> bool {
        let year = record.year();
        self.start_year.is_none_or(|start| year >= start)
            && self.end_year.is_none_or(|end| year <= end)
            && self.pdq.is_none_or(|pdq| record.pdq == Some(pdq))
            && self.category.is_none_or(|category| record.category == category)
    }
}

/// Snapshot of the data source's cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// Number of memoized filter results.
    pub filtered_cache_size: usize,
    /// Whether the incident table has been loaded.
    pub data_loaded: bool,
    /// Row count of the loaded table.
    pub row_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, pdq: Option<u16>, category: CrimeCategory) -> IncidentRecord {
        IncidentRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category,
            time_of_day: None,
            pdq,
            longitude: None,
            latitude: None,
        }
    }

    #[test]
    fn derived_calendar_fields() {
        let r = record("2021-12-25", Some(38), CrimeCategory::Robbery);
        assert_eq!(r.year(), 2021);
        assert_eq!(r.month(), 12);
        assert_eq!(r.season(), Season::Winter);
        assert_eq!(r.day_type(), DayType::Weekend);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let r = record("2018-06-01", None, CrimeCategory::Other);
        assert!(IncidentFilter::default().matches(&r));
    }

    #[test]
    fn year_range_is_inclusive() {
        let filter = IncidentFilter {
            start_year: Some(2017),
            end_year: Some(2019),
            ..IncidentFilter::default()
        };
        assert!(filter.matches(&record("2017-01-01", None, CrimeCategory::Mischief)));
        assert!(filter.matches(&record("2019-12-31", None, CrimeCategory::Mischief)));
        assert!(!filter.matches(&record("2016-12-31", None, CrimeCategory::Mischief)));
        assert!(!filter.matches(&record("2020-01-01", None, CrimeCategory::Mischief)));
    }

    #[test]
    fn pdq_filter_excludes_missing_station() {
        let filter = IncidentFilter {
            pdq: Some(38),
            ..IncidentFilter::default()
        };
        assert!(filter.matches(&record("2020-01-01", Some(38), CrimeCategory::Robbery)));
        assert!(!filter.matches(&record("2020-01-01", Some(21), CrimeCategory::Robbery)));
        assert!(!filter.matches(&record("2020-01-01", None, CrimeCategory::Robbery)));
    }

    #[test]
    fn coordinates_require_both_axes() {
        let mut r = record("2020-01-01", None, CrimeCategory::Robbery);
        r.longitude = Some(-73.58);
        assert_eq!(r.coordinates(), None);
        r.latitude = Some(45.52);
        assert_eq!(r.coordinates(), Some((-73.58, 45.52)));
    }
}
