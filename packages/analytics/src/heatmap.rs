//! Category by period heatmaps.

use std::collections::{BTreeMap, BTreeSet};

use crime_dashboard_analytics_models::HeatmapMatrix;
use crime_dashboard_crime_models::{Season, TimeOfDay};
use crime_dashboard_data::IncidentSource;
use crime_dashboard_data_models::{IncidentRecord, Page};
use crime_dashboard_figure_models::{
    Axis, AxisValue, Button, ColorBar, Colorscale, Figure, HeatmapTrace, Layout, Pad, Title,
    UpdateMenu,
};
use serde_json::json;

use crate::AnalyticsError;

/// Counts incidents per `(category label, column)` cell.
///
/// Rows are sorted by category label and columns by their natural order.
/// Records for which `column` returns `None` are left out.
fn matrix<C, F>(records: &[IncidentRecord], column: F) -> (Vec<String>, Vec<C>, Vec<Vec<u64>>)
where
    C: Ord + Copy,
    F: Fn(&IncidentRecord) -> Option<C>,
{
    let mut cells = BTreeMap::<(String, C), u64>::new();
    let mut columns = BTreeSet::new();

    for record in records {
        if let Some(col) = column(record) {
            columns.insert(col);
            *cells.entry((record.category.to_string(), col)).or_default() += 1;
        }
    }

    let rows = cells
        .keys()
        .map(|(row, _)| row.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let columns = columns.into_iter().collect::<Vec<_>>();

    let counts = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| cells.get(&(row.clone(), *col)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    (rows, columns, counts)
}

/// Category by time of day. Incidents without a shift are left out.
#[must_use]
pub fn by_time_of_day(records: &[IncidentRecord]) -> HeatmapMatrix {
    let (rows, columns, counts) = matrix(records, |r| r.time_of_day);
    HeatmapMatrix {
        rows,
        columns: columns
            .into_iter()
            .map(|c: TimeOfDay| c.as_ref().into())
            .collect(),
        counts,
    }
}

/// Category by season, winter first.
#[must_use]
pub fn by_season(records: &[IncidentRecord]) -> HeatmapMatrix {
    let (rows, columns, counts) = matrix(records, |r| Some(r.season()));
    HeatmapMatrix {
        rows,
        columns: columns
            .into_iter()
            .map(|c: Season| c.as_ref().into())
            .collect(),
        counts,
    }
}

/// Category by year.
#[must_use]
pub fn by_year(records: &[IncidentRecord]) -> HeatmapMatrix {
    let (rows, columns, counts) = matrix(records, |r| Some(r.year()));
    HeatmapMatrix {
        rows,
        columns: columns.into_iter().map(AxisValue::from).collect(),
        counts,
    }
}

/// Builds the heatmap figure: one trace per period dimension, only the
/// first visible, with buttons switching between them.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if the incidents can't be loaded.
pub fn heatmap_figure(source: &dyn IncidentSource) -> Result<Figure, AnalyticsError> {
    let records = source.incidents(Page::Heatmap)?;

    let views = [
        ("Time of Day", "Time", "By Time of Day", by_time_of_day(&records)),
        ("Season", "Season", "By Season", by_season(&records)),
        ("Year", "Year", "By Year", by_year(&records)),
    ];

    let buttons = views
        .iter()
        .enumerate()
        .map(|(i, (_, _, label, _))| Button {
            label: (*label).to_string(),
            method: "restyle".to_string(),
            args: vec![json!({ "visible": (0..views.len()).map(|j| j == i).collect::<Vec<_>>() })],
        })
        .collect();

    let mut figure = Figure::new(Layout {
        title: Some(Title::new("Crime Heatmap Analysis")),
        xaxis: Some(Axis::titled("Time Period")),
        yaxis: Some(Axis::titled("Crime Type")),
        height: Some(600.0),
        updatemenus: vec![UpdateMenu {
            menu_type: "buttons".to_string(),
            direction: "left".to_string(),
            buttons,
            pad: Some(Pad {
                r: Some(10.0),
                t: Some(10.0),
            }),
            showactive: true,
            x: 0.01,
            xanchor: "left".to_string(),
            y: 1.02,
            yanchor: "top".to_string(),
        }],
        ..Layout::default()
    });

    for (i, (name, axis_label, _, matrix)) in views.into_iter().enumerate() {
        figure.push_trace(HeatmapTrace {
            name: Some(name.to_string()),
            z: matrix.counts,
            x: matrix.columns,
            y: matrix.rows,
            colorscale: Colorscale::Named("YlOrRd".to_string()),
            colorbar: Some(ColorBar {
                title: Title::new("Number of Crimes"),
            }),
            visible: Some(i == 0),
            hovertemplate: Some(format!(
                "<b>Crime Type:</b> %{{y}}<br><b>{axis_label}:</b> %{{x}}<br><b>Count:</b> %{{z}}<extra></extra>"
            )),
        });
    }

    Ok(figure)
}

#[cfg(test)]
mod tests {
    use crime_dashboard_crime_models::CrimeCategory;
    use crime_dashboard_data::StaticSource;
    use crime_dashboard_figure_models::Trace;

    use super::*;
    use crate::test_support::record;

    fn records() -> Vec<IncidentRecord> {
        vec![
            record("2019-07-01", CrimeCategory::Robbery, Some(TimeOfDay::Night), None),
            record("2019-07-02", CrimeCategory::Robbery, Some(TimeOfDay::Night), None),
            record("2020-01-05", CrimeCategory::Mischief, Some(TimeOfDay::Day), None),
            record("2021-10-05", CrimeCategory::BreakingAndEntering, None, None),
        ]
    }

    #[test]
    fn time_matrix_fills_missing_cells_with_zero() {
        let m = by_time_of_day(&records());
        assert_eq!(m.rows, ["Mischief", "Robbery"]);
        assert_eq!(m.columns, [AxisValue::from("Day"), AxisValue::from("Night")]);
        assert_eq!(m.counts, [vec![1, 0], vec![0, 2]]);
    }

    #[test]
    fn season_matrix_rows_sorted_by_label() {
        let m = by_season(&records());
        assert_eq!(m.rows, ["Breaking And Entering", "Mischief", "Robbery"]);
        assert_eq!(
            m.columns,
            [
                AxisValue::from("Winter"),
                AxisValue::from("Summer"),
                AxisValue::from("Autumn"),
            ]
        );
        assert_eq!(m.counts, [vec![0, 0, 1], vec![1, 0, 0], vec![0, 2, 0]]);
    }

    #[test]
    fn year_matrix_columns_ascending() {
        let m = by_year(&records());
        assert_eq!(m.columns, [2019, 2020, 2021].map(AxisValue::from).to_vec());
    }

    #[test]
    fn figure_shows_first_view_only() {
        let source = StaticSource::new(records());
        let figure = heatmap_figure(&source).unwrap();

        let visible = figure
            .data
            .iter()
            .map(|t| match t {
                Trace::Heatmap(h) => h.visible,
                _ => panic!("expected heatmap trace"),
            })
            .collect::<Vec<_>>();
        assert_eq!(visible, [Some(true), Some(false), Some(false)]);

        let buttons = &figure.layout.updatemenus[0].buttons;
        assert_eq!(buttons[1].label, "By Season");
        assert_eq!(buttons[1].args[0], json!({ "visible": [false, true, false] }));
    }
}
