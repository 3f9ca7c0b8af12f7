#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart options, page controls, and reference table types.
//!
//! These are the request and response shapes of the non-map dashboard
//! pages: the timeline, temporal, scatter, and heatmap views.

use crime_dashboard_crime_models::CrimeCategory;
use crime_dashboard_figure_models::{AxisValue, Figure};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Period the timeline groups incidents by.
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
#[strum(ascii_case_insensitive)]
pub enum TimelineView {
    /// Crimes per year.
    #[default]
    #[serde(rename = "Yearly", alias = "yearly")]
    Yearly,
    /// Crimes per season.
    #[serde(rename = "Seasonal", alias = "seasonal")]
    Seasonal,
    /// Crimes per calendar month.
    #[serde(rename = "Monthly", alias = "monthly")]
    Monthly,
}

/// How the timeline series is drawn.
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
#[strum(ascii_case_insensitive)]
pub enum ChartType {
    #[default]
    #[serde(rename = "Line", alias = "line")]
    Line,
    #[serde(rename = "Bar", alias = "bar")]
    Bar,
}

/// Inclusive range of years present in the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

/// An entry of the station dropdown. `value` is `None` for "All PDQs".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdqOption {
    pub label: String,
    pub value: Option<u16>,
}

/// Widget options for the temporal page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalControls {
    /// `None` when no incidents are loaded.
    pub year_range: Option<YearRange>,
    pub pdq_options: Vec<PdqOption>,
}

/// The three linked charts of the temporal page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalFigures {
    /// Crimes per time of day.
    pub bar: Figure,
    /// Weekday versus weekend share.
    pub pie: Figure,
    /// Night-time crimes per year.
    pub line: Figure,
}

/// Descriptive profile of a neighbourhood police station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdqProfile {
    pub pdq: u16,
    pub district: String,
    pub area: String,
    #[serde(rename = "type")]
    pub area_type: String,
    pub description: String,
}

impl PdqProfile {
    /// One-line summary used in chart tooltips.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "PDQ {} - {} ({}): {}",
            self.pdq, self.area, self.area_type, self.description
        )
    }
}

/// Official name of a police station's territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdqStation {
    pub pdq: u16,
    pub name: String,
}

/// One station-year of the scatter page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub pdq: u16,
    pub year: i32,
    /// Most frequent category that year.
    pub dominant_category: CrimeCategory,
    /// Incidents at this station that year.
    pub count: usize,
    /// Station description for the tooltip.
    pub info: String,
}

/// Category by period count table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMatrix {
    /// Row labels (categories).
    pub rows: Vec<String>,
    /// Column labels (periods).
    pub columns: Vec<AxisValue>,
    /// `counts[row][column]`, zero where no incident falls.
    pub counts: Vec<Vec<u64>>,
}
