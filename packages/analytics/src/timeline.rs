//! Crimes per year, season, or month.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crime_dashboard_analytics_models::{ChartType, TimelineView};
use crime_dashboard_crime_models::Season;
use crime_dashboard_data::IncidentSource;
use crime_dashboard_data_models::{IncidentRecord, Page};
use crime_dashboard_figure_models::{
    Axis, AxisValue, BarTrace, Figure, Layout, Legend, Line, ScatterTrace, Title,
};

use crate::AnalyticsError;

/// Years shown by the yearly view.
pub const YEARLY_RANGE: RangeInclusive<i32> = 2015..=2025;

/// Per-period incident counts for `view`, in display order.
///
/// Yearly counts cover [`YEARLY_RANGE`] only. Periods without incidents
/// are omitted.
#[must_use]
pub fn timeline_series(records: &[IncidentRecord], view: TimelineView) -> Vec<(AxisValue, u64)> {
    match view {
        TimelineView::Yearly => {
            let mut years = BTreeMap::<i32, u64>::new();
            for year in records.iter().map(IncidentRecord::year) {
                if YEARLY_RANGE.contains(&year) {
                    *years.entry(year).or_default() += 1;
                }
            }
            years.into_iter().map(|(y, n)| (y.into(), n)).collect()
        }
        TimelineView::Seasonal => {
            let mut seasons = BTreeMap::<Season, u64>::new();
            for season in records.iter().map(IncidentRecord::season) {
                *seasons.entry(season).or_default() += 1;
            }
            seasons
                .into_iter()
                .map(|(s, n)| (s.as_ref().into(), n))
                .collect()
        }
        TimelineView::Monthly => {
            let mut months = BTreeMap::<u32, u64>::new();
            for month in records.iter().map(IncidentRecord::month) {
                *months.entry(month).or_default() += 1;
            }
            months.into_iter().map(|(m, n)| (m.into(), n)).collect()
        }
    }
}

/// Median of `values`, averaging the middle pair for an even count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn median(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    })
}

/// Builds the timeline figure for `view`, drawn as `chart`, with a dashed
/// median reference line.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if the incidents can't be loaded.
pub fn timeline_figure(
    source: &dyn IncidentSource,
    view: TimelineView,
    chart: ChartType,
) -> Result<Figure, AnalyticsError> {
    let records = source.incidents(Page::Timeline)?;
    let series = timeline_series(&records, view);
    log::debug!("Timeline {view} series has {} periods", series.len());

    let (x, y): (Vec<AxisValue>, Vec<u64>) = series.into_iter().unzip();
    let counts = y.iter().copied().map(AxisValue::from).collect::<Vec<_>>();

    let mut figure = Figure::new(timeline_layout(view));
    match chart {
        ChartType::Line => figure.push_trace(ScatterTrace {
            name: Some("Crimes".to_string()),
            x: x.clone(),
            y: counts,
            mode: Some("lines+markers".to_string()),
            ..ScatterTrace::default()
        }),
        ChartType::Bar => figure.push_trace(BarTrace {
            name: Some("Crimes".to_string()),
            x: x.clone(),
            y: counts,
            ..BarTrace::default()
        }),
    }

    if let Some(median) = median(&y) {
        figure.push_trace(ScatterTrace {
            name: Some(format!("Median: {median:.0}")),
            y: vec![AxisValue::Number(median); x.len()],
            x,
            mode: Some("lines".to_string()),
            line: Some(Line {
                color: Some("red".to_string()),
                dash: Some("dash".to_string()),
                width: None,
            }),
            ..ScatterTrace::default()
        });
    }

    Ok(figure)
}

fn timeline_layout(view: TimelineView) -> Layout {
    let title = match view {
        TimelineView::Yearly => "Annual Crime Numbers",
        TimelineView::Seasonal => "Seasonal Crime Numbers",
        TimelineView::Monthly => "Monthly Crime Numbers",
    };

    Layout {
        title: Some(Title::new(title)),
        xaxis: Some(Axis::titled(view.as_ref())),
        yaxis: Some(Axis::titled("Number of Crimes")),
        hovermode: Some("x".to_string()),
        legend: Some(Legend {
            title: Some(Title::new("Legend")),
            ..Legend::default()
        }),
        ..Layout::default()
    }
}

#[cfg(test)]
mod tests {
    use crime_dashboard_crime_models::CrimeCategory;
    use crime_dashboard_data::StaticSource;
    use crime_dashboard_figure_models::Trace;

    use super::*;
    use crate::test_support::record;

    fn records() -> Vec<IncidentRecord> {
        [
            "2014-06-01",
            "2016-01-10",
            "2016-07-04",
            "2017-12-24",
            "2016-10-31",
            "2026-03-01",
        ]
        .into_iter()
        .map(|d| record(d, CrimeCategory::Mischief, None, None))
        .collect()
    }

    #[test]
    fn yearly_series_is_restricted_and_sorted() {
        let series = timeline_series(&records(), TimelineView::Yearly);
        assert_eq!(
            series,
            [(AxisValue::from(2016), 3), (AxisValue::from(2017), 1)]
        );
    }

    #[test]
    fn seasonal_series_runs_winter_to_autumn() {
        let series = timeline_series(&records(), TimelineView::Seasonal);
        let labels = series.iter().map(|(s, _)| s.clone()).collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                AxisValue::from("Winter"),
                AxisValue::from("Spring"),
                AxisValue::from("Summer"),
                AxisValue::from("Autumn"),
            ]
        );
        assert_eq!(series[0].1, 2);
        assert_eq!(series[2].1, 2);
    }

    #[test]
    fn monthly_series_is_ascending() {
        let series = timeline_series(&records(), TimelineView::Monthly);
        let months = series.iter().map(|(m, _)| m.clone()).collect::<Vec<_>>();
        assert_eq!(
            months,
            [1_u32, 3, 6, 7, 10, 12].map(AxisValue::from).to_vec()
        );
    }

    #[test]
    fn median_of_even_and_odd_counts() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[5]), Some(5.0));
        assert_eq!(median(&[9, 1, 4]), Some(4.0));
        assert_eq!(median(&[1, 2, 3, 10]), Some(2.5));
    }

    #[test]
    fn figure_has_series_and_median_line() {
        let source = StaticSource::new(records());
        let figure = timeline_figure(&source, TimelineView::Yearly, ChartType::Bar).unwrap();

        assert_eq!(figure.data.len(), 2);
        assert!(matches!(figure.data[0], Trace::Bar(_)));
        let Trace::Scatter(median) = &figure.data[1] else {
            panic!("expected median line");
        };
        assert_eq!(median.name.as_deref(), Some("Median: 2"));
        assert_eq!(median.y, [AxisValue::Number(2.0), AxisValue::Number(2.0)]);
        assert_eq!(
            figure.layout.title.as_ref().unwrap().text,
            "Annual Crime Numbers"
        );
    }

    #[test]
    fn empty_data_has_no_median_line() {
        let source = StaticSource::new(Vec::new());
        let figure = timeline_figure(&source, TimelineView::Monthly, ChartType::Line).unwrap();
        assert_eq!(figure.data.len(), 1);
    }
}
