#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime dashboard server.
//!
//! Query parameter structs mirror the dashboard widgets; response structs
//! are serialized as camelCase JSON. Figures themselves are returned as
//! Plotly figure JSON and have no wrapper here.

use std::fmt;

use crime_dashboard_analytics_models::{ChartType, TimelineView};
use crime_dashboard_crime_models::CrimeCategory;
use crime_dashboard_data_models::{CacheInfo, IncidentFilter};
use crime_dashboard_map_models::{DEFAULT_POINTS_PER_DISTRICT, ReductionStrategy};
use serde::{Deserialize, Serialize};

/// Value of the `pdq` parameter that selects every station.
pub const ALL_PDQS: &str = "All";

/// Query parameters for the map endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQuery {
    /// Point reduction strategy. Defaults to representative-by-type.
    pub strategy: Option<ReductionStrategy>,
    /// Markers per district, `1..=5`.
    pub max_points: Option<usize>,
}

impl MapQuery {
    #[must_use]
    pub fn strategy(&self) -> ReductionStrategy {
        self.strategy.unwrap_or_default()
    }

    #[must_use]
    pub fn max_points(&self) -> usize {
        self.max_points.unwrap_or(DEFAULT_POINTS_PER_DISTRICT)
    }
}

/// Query parameters for the timeline endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQuery {
    pub view: Option<TimelineView>,
    pub chart_type: Option<ChartType>,
}

/// Query parameters for the temporal endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalQuery {
    /// Station number, or `"All"`.
    pub pdq: Option<String>,
    /// First year to include.
    pub start_year: Option<i32>,
    /// Last year to include.
    pub end_year: Option<i32>,
}

impl TemporalQuery {
    /// Converts the parameters into an incident filter.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameter`] if `pdq` is neither `"All"` nor a
    /// station number.
    pub fn to_filter(&self) -> Result<IncidentFilter, InvalidParameter> {
        let pdq = match self.pdq.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) if value.eq_ignore_ascii_case(ALL_PDQS) => None,
            Some(value) => Some(value.parse::<u16>().map_err(|_| InvalidParameter {
                name: "pdq",
                value: value.to_string(),
            })?),
        };

        Ok(IncidentFilter {
            start_year: self.start_year,
            end_year: self.end_year,
            pdq,
            category: None,
        })
    }
}

/// A query parameter whose value couldn't be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidParameter {
    /// Parameter name as it appears in the query string.
    pub name: &'static str,
    /// The rejected value.
    pub value: String,
}

impl fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid value '{}' for parameter '{}'", self.value, self.name)
    }
}

impl std::error::Error for InvalidParameter {}

/// Server health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// A crime category with its map colour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub label: String,
    /// `None` for categories that are never drawn on the map.
    pub color: Option<String>,
}

impl From<CrimeCategory> for CategoryInfo {
    fn from(category: CrimeCategory) -> Self {
        Self {
            label: category.to_string(),
            color: category.color().map(ToString::to_string),
        }
    }
}

/// Cache state of the data manager and the map pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub data: CacheInfo,
    /// Whether the joined map table is currently cached.
    pub map_cached: bool,
}

/// JSON body of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
