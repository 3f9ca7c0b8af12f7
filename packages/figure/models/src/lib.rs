#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Plotly-compatible figure JSON types.
//!
//! Every dashboard chart is built as a [`Figure`] and serialized with the
//! key names `plotly.js` expects, so the front end can pass the response
//! straight to `Plotly.react`. Only the attributes the dashboard actually
//! sets are modelled; unset options are omitted from the JSON.

pub mod layout;
pub mod trace;

use serde::{Deserialize, Serialize};

pub use layout::{
    Annotation, Axis, Button, Font, Layout, Legend, MapBounds, Mapbox, Margin, MapCenter, Pad,
    Title, UpdateMenu,
};
pub use trace::{
    BarTrace, ChoroplethMapboxTrace, ColorBar, Colorscale, HeatmapTrace, Line, Marker,
    MarkerColor, MarkerSize, PieTrace, ScatterMapboxTrace, ScatterTrace, Trace,
};

/// A single x/y/customdata value: either a number or a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Text(String),
}

impl From<f64> for AxisValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AxisValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for AxisValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u16> for AxisValue {
    fn from(value: u16) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u64> for AxisValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for AxisValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for AxisValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AxisValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A complete chart: traces plus layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            data: Vec::new(),
            layout,
        }
    }

    /// Appends a trace, drawn above the ones already present.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<Trace>) -> Self {
        self.data.push(trace.into());
        self
    }

    pub fn push_trace(&mut self, trace: impl Into<Trace>) {
        self.data.push(trace.into());
    }
}

/// Outcome of building a figure that may fail on bad data.
///
/// The front end always receives something drawable: a failure is turned
/// into an inline error panel by [`FigureResult::into_figure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FigureResult {
    /// The figure was built successfully.
    Ready {
        /// The chart.
        figure: Figure,
    },
    /// The figure could not be built.
    Failed {
        /// Human-readable reason.
        message: String,
    },
}

impl FigureResult {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns the figure, or an error placeholder describing the failure.
    #[must_use]
    pub fn into_figure(self) -> Figure {
        match self {
            Self::Ready { figure } => figure,
            Self::Failed { message } => error_figure(&message),
        }
    }
}

impl<E: std::fmt::Display> From<Result<Figure, E>> for FigureResult {
    fn from(result: Result<Figure, E>) -> Self {
        match result {
            Ok(figure) => Self::Ready { figure },
            Err(e) => Self::Failed {
                message: e.to_string(),
            },
        }
    }
}

/// Builds the placeholder shown in place of a chart whose data failed to
/// load: a centred message over hidden axes.
#[must_use]
pub fn error_figure(message: &str) -> Figure {
    Figure::new(Layout {
        title: Some(Title::new("Error Loading Crime Data")),
        height: Some(400.0),
        xaxis: Some(Axis {
            visible: Some(false),
            ..Axis::default()
        }),
        yaxis: Some(Axis {
            visible: Some(false),
            ..Axis::default()
        }),
        annotations: vec![Annotation {
            text: format!("Error loading data: {message}"),
            xref: "paper".to_string(),
            yref: "paper".to_string(),
            x: 0.5,
            y: 0.5,
            xanchor: Some("center".to_string()),
            yanchor: Some("middle".to_string()),
            showarrow: false,
            font: Some(Font::size(16.0)),
        }],
        ..Layout::default()
    })
}
