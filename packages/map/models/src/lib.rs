#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime map data types.
//!
//! Incidents are joined with district boundaries into [`JoinedIncident`]s,
//! then thinned per district into [`ReducedPoint`]s by a
//! [`ReductionStrategy`].

use crime_dashboard_crime_models::CrimeCategory;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Smallest accepted points-per-district limit.
pub const MIN_POINTS_PER_DISTRICT: usize = 1;

/// Largest accepted points-per-district limit.
pub const MAX_POINTS_PER_DISTRICT: usize = 5;

/// Points-per-district limit used when the client doesn't pick one.
pub const DEFAULT_POINTS_PER_DISTRICT: usize = 3;

/// An incident inside the city bounds, tagged with its district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedIncident {
    pub category: CrimeCategory,
    pub longitude: f64,
    pub latitude: f64,
    pub pdq: Option<u16>,
    /// Name of the containing district, or `None` if the point falls
    /// outside every polygon.
    pub district: Option<String>,
}

/// An incident chosen to stand for a group of incidents on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReducedPoint {
    #[serde(flatten)]
    pub incident: JoinedIncident,
    /// Size of the group this point represents.
    pub crime_count: usize,
}

/// How the joined incidents are thinned before drawing.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReductionStrategy {
    /// One representative incident for each of the district's most common
    /// categories.
    #[default]
    #[serde(rename = "representative", alias = "strategy_1")]
    #[strum(to_string = "representative", serialize = "strategy_1")]
    RepresentativeByType,
    /// One incident for each of the district's densest ~100 m cells.
    #[serde(rename = "hotspot", alias = "strategy_3")]
    #[strum(to_string = "hotspot", serialize = "strategy_3")]
    Hotspot,
}

impl ReductionStrategy {
    /// Map title for this strategy with `k` points per district.
    #[must_use]
    pub fn title(self, k: usize) -> String {
        match self {
            Self::RepresentativeByType => {
                format!("Montreal Crime Map - Top {k} Crime Types per District")
            }
            Self::Hotspot => format!("Montreal Crime Map - Crime Hotspots ({k} per district)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn strategy_parses_names_and_legacy_aliases() {
        assert_eq!(
            ReductionStrategy::from_str("representative").unwrap(),
            ReductionStrategy::RepresentativeByType
        );
        assert_eq!(
            ReductionStrategy::from_str("strategy_1").unwrap(),
            ReductionStrategy::RepresentativeByType
        );
        assert_eq!(
            ReductionStrategy::from_str("strategy_3").unwrap(),
            ReductionStrategy::Hotspot
        );
        assert!(ReductionStrategy::from_str("strategy_2").is_err());
        assert_eq!(ReductionStrategy::Hotspot.to_string(), "hotspot");
    }

    #[test]
    fn strategy_deserializes_alias() {
        let strategy: ReductionStrategy = serde_json::from_str("\"strategy_3\"").unwrap();
        assert_eq!(strategy, ReductionStrategy::Hotspot);
    }

    #[test]
    fn titles() {
        assert_eq!(
            ReductionStrategy::RepresentativeByType.title(3),
            "Montreal Crime Map - Top 3 Crime Types per District"
        );
        assert_eq!(
            ReductionStrategy::Hotspot.title(2),
            "Montreal Crime Map - Crime Hotspots (2 per district)"
        );
    }

    #[test]
    fn reduced_point_flattens_incident() {
        let point = ReducedPoint {
            incident: JoinedIncident {
                category: CrimeCategory::Robbery,
                longitude: -73.57,
                latitude: 45.52,
                pdq: Some(38),
                district: Some("Plateau".to_string()),
            },
            crime_count: 4,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["category"], "Robbery");
        assert_eq!(json["district"], "Plateau");
        assert_eq!(json["crimeCount"], 4);
    }
}
