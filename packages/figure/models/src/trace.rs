//! Trace types, one per Plotly chart kind used by the dashboard.

use serde::{Deserialize, Serialize};

use crate::{AxisValue, Title};

/// A Plotly trace, tagged by its `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Bar(BarTrace),
    Pie(PieTrace),
    Heatmap(HeatmapTrace),
    Choroplethmapbox(ChoroplethMapboxTrace),
    Scattermapbox(ScatterMapboxTrace),
}

macro_rules! impl_into_trace {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Trace {
                fn from(trace: $ty) -> Self {
                    Self::$variant(trace)
                }
            }
        )*
    };
}

impl_into_trace!(
    ScatterTrace => Scatter,
    BarTrace => Bar,
    PieTrace => Pie,
    HeatmapTrace => Heatmap,
    ChoroplethMapboxTrace => Choroplethmapbox,
    ScatterMapboxTrace => Scattermapbox,
);

/// Marker size: one size for every point, or one per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerSize {
    Uniform(f64),
    PerPoint(Vec<f64>),
}

/// Marker colour: one colour for every point, or one per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Uniform(String),
    PerPoint(Vec<String>),
}

/// Colour scale: a named Plotly scale or explicit `[position, colour]` stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Colorscale {
    Named(String),
    Stops(Vec<(f64, String)>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<MarkerSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<MarkerColor>,
    /// Per-slice colours (pie charts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizeref: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<AxisValue>,
    pub y: Vec<AxisValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<Vec<AxisValue>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<AxisValue>,
    pub y: Vec<AxisValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<AxisValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texttemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PieTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textinfo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Row-major counts: `z[row][column]`.
    pub z: Vec<Vec<u64>>,
    pub x: Vec<AxisValue>,
    pub y: Vec<String>,
    pub colorscale: Colorscale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<ColorBar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethMapboxTrace {
    /// The boundary `FeatureCollection` the locations refer to.
    pub geojson: serde_json::Value,
    pub locations: Vec<String>,
    pub z: Vec<f64>,
    pub featureidkey: String,
    pub colorscale: Colorscale,
    pub showscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterMapboxTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<Vec<AxisValue>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}
