//! Time of day, day type, and night-time trend charts.

use std::collections::BTreeMap;

use crime_dashboard_analytics_models::{PdqOption, TemporalControls, TemporalFigures, YearRange};
use crime_dashboard_crime_models::{DayType, TimeOfDay};
use crime_dashboard_data::IncidentSource;
use crime_dashboard_data_models::{IncidentFilter, IncidentRecord, Page};
use crime_dashboard_figure_models::{
    Axis, AxisValue, BarTrace, Figure, Layout, Legend, Line, Marker, MarkerColor, MarkerSize,
    PieTrace, ScatterTrace, Title,
};

use crate::{AnalyticsError, count_in_order, reference, sort_descending};

/// Headroom above the tallest bar so its outside label stays visible.
const BAR_HEADROOM: f64 = 1.10;

/// Incidents per time of day, most frequent first. Incidents without a
/// recognized shift are not counted.
#[must_use]
pub fn time_of_day_counts(records: &[IncidentRecord]) -> Vec<(TimeOfDay, u64)> {
    let mut counts = TimeOfDay::all()
        .iter()
        .map(|tod| {
            let n = records.iter().filter(|r| r.time_of_day == Some(*tod)).count();
            (*tod, n as u64)
        })
        .filter(|(_, n)| *n > 0)
        .collect::<Vec<_>>();
    sort_descending(&mut counts);
    counts
}

/// Incidents per day type, most frequent first.
#[must_use]
pub fn day_type_counts(records: &[IncidentRecord]) -> Vec<(DayType, u64)> {
    let mut counts = count_in_order(records.iter().map(IncidentRecord::day_type));
    sort_descending(&mut counts);
    counts
}

/// Night-time incidents per year, ascending by year.
#[must_use]
pub fn night_counts_by_year(records: &[IncidentRecord]) -> Vec<(i32, u64)> {
    let mut years = BTreeMap::<i32, u64>::new();
    for record in records
        .iter()
        .filter(|r| r.time_of_day == Some(TimeOfDay::Night))
    {
        *years.entry(record.year()).or_default() += 1;
    }
    years.into_iter().collect()
}

/// Year-over-year change in percent. The first entry is `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn year_over_year_changes(counts: &[u64]) -> Vec<f64> {
    let mut changes = Vec::with_capacity(counts.len());
    let mut previous: Option<u64> = None;
    for &count in counts {
        let change = match previous {
            Some(prev) if prev > 0 => (count as f64 - prev as f64) / prev as f64 * 100.0,
            _ => 0.0,
        };
        changes.push(change);
        previous = Some(count);
    }
    changes
}

/// Year range and station options for the temporal page widgets.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if the incidents can't be loaded.
pub fn temporal_controls(source: &dyn IncidentSource) -> Result<TemporalControls, AnalyticsError> {
    let records = source.incidents(Page::Temporal)?;

    let year_range = records
        .iter()
        .map(IncidentRecord::year)
        .fold(None, |range: Option<YearRange>, year| {
            Some(range.map_or(YearRange { start: year, end: year }, |r| YearRange {
                start: r.start.min(year),
                end: r.end.max(year),
            }))
        });

    let mut stations = records.iter().filter_map(|r| r.pdq).collect::<Vec<_>>();
    stations.sort_unstable();
    stations.dedup();

    let pdq_options = std::iter::once(PdqOption {
        label: "All PDQs".to_string(),
        value: None,
    })
    .chain(stations.into_iter().map(|pdq| PdqOption {
        label: reference::pdq_label(pdq),
        value: Some(pdq),
    }))
    .collect();

    Ok(TemporalControls {
        year_range,
        pdq_options,
    })
}

/// Builds the three temporal charts over the incidents matching `filter`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if the incidents can't be loaded.
pub fn temporal_figures(
    source: &dyn IncidentSource,
    filter: &IncidentFilter,
) -> Result<TemporalFigures, AnalyticsError> {
    let records = source.filtered(filter)?;
    log::debug!("Temporal page over {} incidents ({filter:?})", records.len());

    Ok(TemporalFigures {
        bar: time_of_day_bar(&records),
        pie: day_type_pie(&records),
        line: night_trend_line(&records),
    })
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn time_of_day_bar(records: &[IncidentRecord]) -> Figure {
    let counts = time_of_day_counts(records);
    let y_max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);

    let mut figure = Figure::new(Layout {
        title: Some(Title::new("Crime by Time of Day")),
        xaxis: Some(Axis {
            ticklabeloverflow: Some("allow".to_string()),
            ..Axis::titled("Time of Day")
        }),
        yaxis: Some(Axis {
            range: Some([0.0, y_max as f64 * BAR_HEADROOM]),
            automargin: Some(true),
            ..Axis::titled("Number of Crimes")
        }),
        hovermode: Some("x".to_string()),
        legend: Some(Legend {
            title: Some(Title::new("Time of Day")),
            ..Legend::default()
        }),
        ..Layout::default()
    });

    for (tod, n) in counts {
        figure.push_trace(BarTrace {
            name: Some(tod.long_label().to_string()),
            x: vec![tod.long_label().into()],
            y: vec![n.into()],
            text: Some(vec![n.into()]),
            texttemplate: Some("%{text}".to_string()),
            textposition: Some("outside".to_string()),
            marker: Some(Marker {
                color: Some(MarkerColor::Uniform(tod.color().to_string())),
                ..Marker::default()
            }),
            showlegend: None,
        });
    }

    figure
}

#[must_use]
pub fn day_type_pie(records: &[IncidentRecord]) -> Figure {
    let counts = day_type_counts(records);

    Figure::new(Layout {
        title: Some(Title::new("Crimes: Weekday vs Weekend")),
        legend: Some(Legend {
            title: Some(Title::new("Day Type")),
            ..Legend::default()
        }),
        ..Layout::default()
    })
    .with_trace(PieTrace {
        name: Some("Day Type".to_string()),
        labels: counts.iter().map(|(d, _)| d.to_string()).collect(),
        values: counts.iter().map(|(_, n)| *n).collect(),
        hole: Some(0.5),
        marker: Some(Marker {
            colors: Some(counts.iter().map(|(d, _)| d.color().to_string()).collect()),
            ..Marker::default()
        }),
        textinfo: Some("label+percent".to_string()),
        hoverinfo: Some("label+percent+value".to_string()),
    })
}

#[must_use]
pub fn night_trend_line(records: &[IncidentRecord]) -> Figure {
    let trend = night_counts_by_year(records);
    let counts = trend.iter().map(|(_, n)| *n).collect::<Vec<_>>();
    let changes = year_over_year_changes(&counts);
    let color = TimeOfDay::Night.color().to_string();

    Figure::new(Layout {
        title: Some(Title::new("Night-Time Crime Trends")),
        xaxis: Some(Axis {
            axis_type: Some("category".to_string()),
            ..Axis::titled("Year")
        }),
        yaxis: Some(Axis::titled("Number of Crimes")),
        hovermode: Some("x unified".to_string()),
        showlegend: Some(false),
        ..Layout::default()
    })
    .with_trace(ScatterTrace {
        name: Some(String::new()),
        x: trend.iter().map(|(y, _)| y.to_string().into()).collect(),
        y: counts.iter().copied().map(AxisValue::from).collect(),
        mode: Some("lines+markers".to_string()),
        marker: Some(Marker {
            size: Some(MarkerSize::Uniform(10.0)),
            color: Some(MarkerColor::Uniform(color.clone())),
            ..Marker::default()
        }),
        line: Some(Line {
            width: Some(4.0),
            color: Some(color),
            dash: None,
        }),
        customdata: Some(changes.into_iter().map(|c| vec![c.into()]).collect()),
        hovertemplate: Some(
            "<b>Year:</b> %{x}<br><b>Night Crimes:</b> %{y}<br><b>YoY Change:</b> %{customdata[0]:.1f}%"
                .to_string(),
        ),
        showlegend: None,
    })
}
