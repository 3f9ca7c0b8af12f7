//! Map figure rendering.

use crime_dashboard_crime_models::CrimeCategory;
use crime_dashboard_figure_models::{
    AxisValue, ChoroplethMapboxTrace, Colorscale, Figure, Font, Layout, Legend, Line, MapBounds,
    MapCenter, Mapbox, Margin, Marker, MarkerColor, MarkerSize, Pad, ScatterMapboxTrace, Title,
};
use crime_dashboard_map_models::{ReducedPoint, ReductionStrategy};
use crime_dashboard_spatial::NAME_PROPERTY;

use crate::ProcessedData;

const BASE_MARKER_SIZE: f64 = 8.0;
const MAX_MARKER_SIZE: f64 = 20.0;

const MAP_CENTER: MapCenter = MapCenter {
    lat: 45.55,
    lon: -73.6,
};

const MAP_BOUNDS: MapBounds = MapBounds {
    west: -74.1,
    east: -73.3,
    south: 45.35,
    north: 45.75,
};

/// Marker size for a point standing for `crime_count` incidents.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn marker_size(crime_count: usize) -> f64 {
    (BASE_MARKER_SIZE + crime_count as f64 / 10.0).min(MAX_MARKER_SIZE)
}

/// Draws the district boundaries with the reduced points on top, one
/// marker trace per category.
#[must_use]
pub fn render_map(
    data: &ProcessedData,
    points: &[ReducedPoint],
    strategy: ReductionStrategy,
    k: usize,
) -> Figure {
    let mut figure = Figure::new(map_layout(strategy, k)).with_trace(base_layer(data));

    for category in CrimeCategory::all() {
        let Some(color) = category.color() else {
            continue;
        };
        let matching = points
            .iter()
            .filter(|p| p.incident.category == *category)
            .collect::<Vec<_>>();
        if matching.is_empty() {
            continue;
        }
        figure.push_trace(category_layer(*category, color, &matching));
    }

    figure
}

fn base_layer(data: &ProcessedData) -> ChoroplethMapboxTrace {
    let locations = data.geometry.index.names().to_vec();
    let z = vec![1.0; locations.len()];

    ChoroplethMapboxTrace {
        geojson: data.base_geojson.clone(),
        locations,
        z,
        featureidkey: format!("properties.{NAME_PROPERTY}"),
        colorscale: Colorscale::Stops(vec![
            (0.0, "lightgrey".to_string()),
            (1.0, "lightgrey".to_string()),
        ]),
        showscale: false,
        marker: Some(Marker {
            opacity: Some(0.2),
            line: Some(Line {
                width: Some(1.5),
                color: Some("black".to_string()),
                dash: None,
            }),
            ..Marker::default()
        }),
        hovertemplate: Some("District: %{location}<extra></extra>".to_string()),
    }
}

fn category_layer(
    category: CrimeCategory,
    color: &str,
    points: &[&ReducedPoint],
) -> ScatterMapboxTrace {
    let customdata = points
        .iter()
        .map(|p| {
            vec![
                p.incident
                    .pdq
                    .map_or_else(|| AxisValue::from("N/A"), AxisValue::from),
                AxisValue::from(p.incident.district.clone().unwrap_or_default()),
                AxisValue::from(p.crime_count),
            ]
        })
        .collect();

    ScatterMapboxTrace {
        name: Some(category.to_string()),
        lat: points.iter().map(|p| p.incident.latitude).collect(),
        lon: points.iter().map(|p| p.incident.longitude).collect(),
        mode: Some("markers".to_string()),
        marker: Some(Marker {
            size: Some(MarkerSize::PerPoint(
                points.iter().map(|p| marker_size(p.crime_count)).collect(),
            )),
            color: Some(MarkerColor::Uniform(color.to_string())),
            opacity: Some(0.8),
            ..Marker::default()
        }),
        customdata: Some(customdata),
        hovertemplate: Some(format!(
            "<b>{category}</b><br>District: %{{customdata[1]}}<br>PDQ: %{{customdata[0]}}<br>Crime Count: %{{customdata[2]}}<extra></extra>"
        )),
    }
}

fn map_layout(strategy: ReductionStrategy, k: usize) -> Layout {
    Layout {
        title: Some(Title {
            text: strategy.title(k),
            x: Some(0.5),
            font: Some(Font::size(18.0)),
            pad: Some(Pad {
                t: Some(20.0),
                r: None,
            }),
        }),
        height: Some(700.0),
        mapbox: Some(Mapbox {
            style: "white-bg".to_string(),
            zoom: 8.5,
            center: MAP_CENTER,
            bounds: Some(MAP_BOUNDS),
        }),
        margin: Some(Margin {
            t: 60.0,
            r: 10.0,
            l: 10.0,
            b: 10.0,
        }),
        legend: Some(Legend {
            bgcolor: Some("rgba(255,255,255,0.8)".to_string()),
            bordercolor: Some("Black".to_string()),
            borderwidth: Some(1.0),
            ..Legend::right_side()
        }),
        ..Layout::default()
    }
}

#[cfg(test)]
mod tests {
    use crime_dashboard_figure_models::Trace;
    use crime_dashboard_map_models::JoinedIncident;
    use crime_dashboard_spatial::DistrictGeometry;

    use super::*;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NOM": "Plateau" },
                "geometry": { "type": "Polygon", "coordinates": [[[-73.60, 45.50], [-73.55, 45.50], [-73.55, 45.55], [-73.60, 45.50]]] }
            },
            {
                "type": "Feature",
                "properties": { "NOM": "Verdun" },
                "geometry": { "type": "Polygon", "coordinates": [[[-73.55, 45.45], [-73.50, 45.45], [-73.50, 45.50], [-73.55, 45.45]]] }
            }
        ]
    }"#;

    fn data() -> ProcessedData {
        let geometry = DistrictGeometry::parse(DISTRICTS).unwrap();
        let base_geojson = serde_json::to_value(&geometry.collection).unwrap();
        ProcessedData {
            geometry,
            base_geojson,
            joined: Vec::new(),
            districts: Vec::new(),
        }
    }

    fn point(category: CrimeCategory, pdq: Option<u16>, crime_count: usize) -> ReducedPoint {
        ReducedPoint {
            incident: JoinedIncident {
                category,
                longitude: -73.57,
                latitude: 45.52,
                pdq,
                district: Some("Plateau".to_string()),
            },
            crime_count,
        }
    }

    #[test]
    fn marker_size_is_capped() {
        assert!((marker_size(0) - 8.0).abs() < f64::EPSILON);
        assert!((marker_size(50) - 13.0).abs() < f64::EPSILON);
        assert!((marker_size(120) - 20.0).abs() < f64::EPSILON);
        assert!((marker_size(5000) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn base_layer_covers_every_district() {
        let figure = render_map(&data(), &[], ReductionStrategy::Hotspot, 2);
        assert_eq!(figure.data.len(), 1);
        let Trace::Choroplethmapbox(base) = &figure.data[0] else {
            panic!("expected base layer first");
        };
        assert_eq!(base.locations, ["Plateau", "Verdun"]);
        assert_eq!(base.z, [1.0, 1.0]);
        assert_eq!(base.featureidkey, "properties.NOM");
        assert_eq!(
            figure.layout.title.as_ref().unwrap().text,
            "Montreal Crime Map - Crime Hotspots (2 per district)"
        );
    }

    #[test]
    fn one_trace_per_drawn_category_in_palette_order() {
        let points = vec![
            point(CrimeCategory::Robbery, Some(38), 10),
            point(CrimeCategory::Mischief, None, 50),
            point(CrimeCategory::Other, Some(38), 99),
            point(CrimeCategory::Mischief, Some(21), 30),
        ];
        let figure = render_map(&data(), &points, ReductionStrategy::RepresentativeByType, 3);

        let names = figure.data[1..]
            .iter()
            .map(|t| match t {
                Trace::Scattermapbox(s) => s.name.clone().unwrap(),
                _ => panic!("expected marker trace"),
            })
            .collect::<Vec<_>>();
        assert_eq!(names, ["Mischief", "Robbery"]);

        let Trace::Scattermapbox(mischief) = &figure.data[1] else {
            unreachable!();
        };
        assert_eq!(
            mischief.marker.as_ref().unwrap().size,
            Some(MarkerSize::PerPoint(vec![13.0, 11.0]))
        );
        let customdata = mischief.customdata.as_ref().unwrap();
        assert_eq!(customdata[0][0], AxisValue::from("N/A"));
        assert_eq!(customdata[1][0], AxisValue::Number(21.0));
        assert_eq!(customdata[1][1], AxisValue::from("Plateau"));
        assert_eq!(customdata[0][2], AxisValue::Number(50.0));
    }

    #[test]
    fn rendering_is_deterministic() {
        let points = vec![
            point(CrimeCategory::Robbery, Some(38), 10),
            point(CrimeCategory::Mischief, None, 50),
        ];
        let data = data();
        assert_eq!(
            render_map(&data, &points, ReductionStrategy::Hotspot, 3),
            render_map(&data, &points, ReductionStrategy::Hotspot, 3)
        );
    }
}
