#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for district attribution.
//!
//! Loads the Montreal district boundaries from a `GeoJSON`
//! `FeatureCollection`, builds an R-tree over their bounding boxes, and
//! answers point-in-polygon lookups. The raw collection is kept alongside
//! the index so the map can draw the same boundaries it joins against.

use std::path::Path;

use geo::{BoundingRect, Intersects, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the district boundary collection.
pub const DISTRICTS_FILE_NAME: &str = "montreal.json";

/// Feature property holding the district name.
pub const NAME_PROPERTY: &str = "NOM";

/// Coordinates outside this box are treated as bad records.
pub const MONTREAL_BOUNDS: BoundingBox = BoundingBox::new(-73.95, 45.40, -73.45, 45.70);

/// Errors that can occur while loading district boundaries.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Reading the boundary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file isn't valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` is valid but not a usable district collection.
    #[error("Malformed district geometry: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Returns `true` if the point lies strictly inside the box.
    #[must_use]
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng > self.west && lng < self.east && lat > self.south && lat < self.north
    }
}

/// A district polygon stored in the R-tree with its metadata.
struct DistrictEntry {
    name: String,
    /// Position of the feature in the source collection.
    order: usize,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for DistrictEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree of district polygons keyed by name.
pub struct DistrictIndex {
    tree: RTree<DistrictEntry>,
    names: Vec<String>,
}

impl DistrictIndex {
    /// Builds the index from every feature of `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Malformed`] if a feature has no geometry, a
    /// non-polygonal geometry, or no string `NOM` property.
    pub fn from_collection(collection: &FeatureCollection) -> Result<Self, SpatialError> {
        let mut entries = Vec::with_capacity(collection.features.len());
        let mut names = Vec::with_capacity(collection.features.len());

        for (order, feature) in collection.features.iter().enumerate() {
            let name = feature
                .property(NAME_PROPERTY)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| SpatialError::Malformed {
                    message: format!("feature {order} has no string '{NAME_PROPERTY}' property"),
                })?
                .to_string();

            let geometry = feature
                .geometry
                .clone()
                .ok_or_else(|| SpatialError::Malformed {
                    message: format!("district '{name}' has no geometry"),
                })?;

            let polygon = to_multipolygon(geometry).ok_or_else(|| SpatialError::Malformed {
                message: format!("district '{name}' is not a Polygon or MultiPolygon"),
            })?;

            names.push(name.clone());
            entries.push(DistrictEntry {
                name,
                order,
                envelope: compute_envelope(&polygon),
                polygon,
            });
        }

        Ok(Self {
            tree: RTree::bulk_load(entries),
            names,
        })
    }

    /// Looks up the district containing a point.
    ///
    /// Points on a boundary count as inside. If districts overlap, the one
    /// listed first in the source collection wins.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<&str> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(&point))
            .min_by_key(|entry| entry.order)
            .map(|entry| entry.name.as_str())
    }

    /// District names in source order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The raw district collection together with its spatial index.
pub struct DistrictGeometry {
    /// Boundaries as read from disk, for rendering.
    pub collection: FeatureCollection,
    /// Index over the same boundaries, for joins.
    pub index: DistrictIndex,
}

impl DistrictGeometry {
    /// Reads and indexes the boundary file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file can't be read or isn't a valid
    /// district `FeatureCollection`.
    pub fn load(path: &Path) -> Result<Self, SpatialError> {
        log::info!("Loading district boundaries from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let geometry = Self::parse(&contents)?;
        log::info!("Loaded {} districts into spatial index", geometry.index.len());
        Ok(geometry)
    }

    /// Parses and indexes a `GeoJSON` document.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the text isn't a valid district
    /// `FeatureCollection`.
    pub fn parse(geojson: &str) -> Result<Self, SpatialError> {
        let GeoJson::FeatureCollection(collection) = geojson.parse::<GeoJson>()? else {
            return Err(SpatialError::Malformed {
                message: "expected a FeatureCollection".to_string(),
            });
        };
        let index = DistrictIndex::from_collection(&collection)?;
        Ok(Self { collection, index })
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
