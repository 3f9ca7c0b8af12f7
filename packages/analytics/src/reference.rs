//! PDQ reference tables, embedded at compile time.
//!
//! Station names label the temporal page's dropdown; station profiles feed
//! the scatter tooltips and the reference table served next to it.

use std::sync::LazyLock;

use crime_dashboard_analytics_models::{PdqProfile, PdqStation};
use serde::Deserialize;

const STATIONS_TOML: &str = include_str!("../reference/pdq_stations.toml");
const PROFILES_TOML: &str = include_str!("../reference/pdq_profiles.toml");

#[derive(Deserialize)]
struct StationsFile {
    station: Vec<PdqStation>,
}

#[derive(Deserialize)]
struct ProfilesFile {
    profile: Vec<PdqProfile>,
}

/// Parsed once; a malformed embedded table is a build defect.
static STATIONS: LazyLock<Vec<PdqStation>> = LazyLock::new(|| {
    let mut stations = toml::from_str::<StationsFile>(STATIONS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse pdq_stations.toml: {e}"))
        .station;
    stations.sort_by_key(|s| s.pdq);
    stations
});

static PROFILES: LazyLock<Vec<PdqProfile>> = LazyLock::new(|| {
    let mut profiles = toml::from_str::<ProfilesFile>(PROFILES_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse pdq_profiles.toml: {e}"))
        .profile;
    profiles.sort_by_key(|p| p.pdq);
    profiles
});

/// All station names, sorted by PDQ number.
#[must_use]
pub fn pdq_stations() -> &'static [PdqStation] {
    &STATIONS
}

/// All station profiles, sorted by PDQ number.
#[must_use]
pub fn pdq_profiles() -> &'static [PdqProfile] {
    &PROFILES
}

#[must_use]
pub fn pdq_name(pdq: u16) -> Option<&'static str> {
    STATIONS
        .binary_search_by_key(&pdq, |s| s.pdq)
        .ok()
        .map(|i| STATIONS[i].name.as_str())
}

#[must_use]
pub fn pdq_profile(pdq: u16) -> Option<&'static PdqProfile> {
    PROFILES
        .binary_search_by_key(&pdq, |p| p.pdq)
        .ok()
        .map(|i| &PROFILES[i])
}

/// Dropdown label: `"{pdq} – {name}"`, or `"{pdq} – PDQ {pdq}"` for
/// stations without a known name.
#[must_use]
pub fn pdq_label(pdq: u16) -> String {
    pdq_name(pdq).map_or_else(
        || format!("{pdq} – PDQ {pdq}"),
        |name| format!("{pdq} – {name}"),
    )
}

/// Tooltip text for a station: its profile summary, or `"PDQ {pdq}"`.
#[must_use]
pub fn pdq_info(pdq: u16) -> String {
    pdq_profile(pdq).map_or_else(|| format!("PDQ {pdq}"), PdqProfile::summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_STATION_COUNT: usize = 34;
    const EXPECTED_PROFILE_COUNT: usize = 33;

    #[test]
    fn loads_all_stations() {
        assert_eq!(pdq_stations().len(), EXPECTED_STATION_COUNT);
        assert!(pdq_stations().windows(2).all(|w| w[0].pdq < w[1].pdq));
    }

    #[test]
    fn loads_all_profiles_sorted() {
        let profiles = pdq_profiles();
        assert_eq!(profiles.len(), EXPECTED_PROFILE_COUNT);
        assert!(profiles.windows(2).all(|w| w[0].pdq < w[1].pdq));
        assert!(profiles.iter().all(|p| !p.area.is_empty() && !p.district.is_empty()));
    }

    #[test]
    fn labels_fall_back_to_number() {
        assert_eq!(pdq_label(38), "38 – Le Plateau-Mont-Royal");
        assert_eq!(pdq_label(99), "99 – PDQ 99");
    }

    #[test]
    fn info_falls_back_to_number() {
        assert_eq!(pdq_info(38), "PDQ 38 - Anjou (Residential): Residential area");
        assert_eq!(pdq_info(50), "PDQ 50");
    }
}
