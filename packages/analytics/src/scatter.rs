//! Police station by year scatter plot.

use crime_dashboard_analytics_models::ScatterPoint;
use crime_dashboard_crime_models::CrimeCategory;
use crime_dashboard_data::IncidentSource;
use crime_dashboard_data_models::{IncidentRecord, Page};
use crime_dashboard_figure_models::{
    Axis, AxisValue, Figure, FigureResult, Layout, Legend, Line, Marker, MarkerSize, ScatterTrace,
    Title,
};

use crate::{AnalyticsError, count_in_order, reference, sort_descending};

/// Diameter, in pixels, of the marker for the busiest station-year.
const MAX_MARKER_SIZE: f64 = 20.0;

/// One point per station and year with incidents, with that year's
/// dominant category. Incidents without a station are skipped.
///
/// Stations appear in order of first appearance, and years in order of
/// first appearance within each station. The dominant category is the most
/// frequent one; ties go to the category seen first.
#[must_use]
pub fn scatter_points(records: &[IncidentRecord]) -> Vec<ScatterPoint> {
    let with_station = records
        .iter()
        .filter_map(|r| r.pdq.map(|pdq| (pdq, r)))
        .collect::<Vec<_>>();

    let mut points = Vec::new();

    for (pdq, _) in count_in_order(with_station.iter().map(|(pdq, _)| *pdq)) {
        let info = reference::pdq_info(pdq);
        let station = with_station
            .iter()
            .filter(|(p, _)| *p == pdq)
            .map(|(_, r)| *r)
            .collect::<Vec<_>>();

        for (year, count) in count_in_order(station.iter().map(|r| r.year())) {
            let mut categories = count_in_order(
                station
                    .iter()
                    .filter(|r| r.year() == year)
                    .map(|r| r.category),
            );
            sort_descending(&mut categories);
            let dominant_category = categories
                .first()
                .map_or(CrimeCategory::Other, |(category, _)| *category);

            points.push(ScatterPoint {
                pdq,
                year,
                dominant_category,
                count: usize::try_from(count).unwrap_or(usize::MAX),
                info: info.clone(),
            });
        }
    }

    points
}

/// Builds the scatter figure.
///
/// Any failure, including having no incident with a station, yields
/// [`FigureResult::Failed`] so the page can show an inline error instead.
#[must_use]
pub fn scatter_figure(source: &dyn IncidentSource) -> FigureResult {
    let result = build_scatter_figure(source);
    if let Err(e) = &result {
        log::error!("Scatter figure failed: {e}");
    }
    result.into()
}

fn build_scatter_figure(source: &dyn IncidentSource) -> Result<Figure, AnalyticsError> {
    let records = source.incidents(Page::Scatter)?;
    let points = scatter_points(&records);

    let max_count = points
        .iter()
        .map(|p| p.count)
        .max()
        .ok_or_else(|| AnalyticsError::Conversion {
            message: "no incidents with a police station".to_string(),
        })?;

    let mut figure = Figure::new(scatter_layout());
    let categories = count_in_order(points.iter().map(|p| p.dominant_category));

    for (category, _) in categories {
        let group = points
            .iter()
            .filter(|p| p.dominant_category == category)
            .collect::<Vec<_>>();
        figure.push_trace(category_trace(category, &group, max_count));
    }

    Ok(figure)
}

#[allow(clippy::cast_precision_loss)]
fn category_trace(category: CrimeCategory, points: &[&ScatterPoint], max_count: usize) -> ScatterTrace {
    ScatterTrace {
        name: Some(category.to_string()),
        x: points.iter().map(|p| p.year.into()).collect(),
        y: points.iter().map(|p| p.pdq.into()).collect(),
        mode: Some("markers".to_string()),
        marker: Some(Marker {
            size: Some(MarkerSize::PerPoint(
                points.iter().map(|p| p.count as f64).collect(),
            )),
            sizemode: Some("area".to_string()),
            sizeref: Some(2.0 * max_count as f64 / MAX_MARKER_SIZE.powi(2)),
            opacity: Some(0.7),
            line: Some(Line {
                width: Some(1.0),
                color: Some("white".to_string()),
                dash: None,
            }),
            ..Marker::default()
        }),
        customdata: Some(
            points
                .iter()
                .map(|p| vec![AxisValue::from(p.info.as_str())])
                .collect(),
        ),
        hovertemplate: Some(format!(
            "Police District (PDQ): %{{y}}<br>Year: %{{x}}<br>Crimes This Year: %{{marker.size}}<br>Crime Type: {category}<br>PDQ Information: %{{customdata[0]}}<extra></extra>"
        )),
        ..ScatterTrace::default()
    }
}

fn scatter_layout() -> Layout {
    let grid_axis = |title: &str| Axis {
        showgrid: Some(true),
        gridwidth: Some(1.0),
        gridcolor: Some("lightgray".to_string()),
        zeroline: Some(false),
        ..Axis::titled(title)
    };

    Layout {
        title: Some(Title::new("Montreal Crime Analysis: Years vs PDQs")),
        width: Some(1000.0),
        height: Some(700.0),
        plot_bgcolor: Some("white".to_string()),
        xaxis: Some(grid_axis("Year")),
        yaxis: Some(grid_axis("Police District (PDQ)")),
        legend: Some(Legend {
            title: Some(Title::new("Dominant Crime Type")),
            ..Legend::right_side()
        }),
        ..Layout::default()
    }
}
