//! GeoJSON geometries and features for image footprints.
//!
//! Positions are `[east longitude, latitude]` pairs. Every coordinate and
//! every float property is rounded to a fixed number of decimals when the
//! object is built, so serialized output is stable across platforms.

use std::str::FromStr;

use isis_common::{IsisError, IsisResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default rounding precision.
pub const PRECISION: u32 = 2;

/// A `[lon, lat]` pair.
pub type Position = [f64; 2];

/// Round `value` to `precision` decimals, ties to even.
pub fn round(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round_ties_even() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn round_position(p: Position, precision: u32) -> Position {
    [round(p[0], precision), round(p[1], precision)]
}

fn round_path(path: Vec<Position>, precision: u32) -> Vec<Position> {
    path.into_iter().map(|p| round_position(p, precision)).collect()
}

fn round_rings(rings: Vec<Vec<Position>>, precision: u32) -> Vec<Vec<Position>> {
    rings.into_iter().map(|r| round_path(r, precision)).collect()
}

/// Geometry kind keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl FromStr for GeometryKind {
    type Err = IsisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "point" => Ok(Self::Point),
            "line" | "linestring" => Ok(Self::LineString),
            "polygon" => Ok(Self::Polygon),
            "multipoint" => Ok(Self::MultiPoint),
            "multiline" | "multilinestring" => Ok(Self::MultiLineString),
            "multipolygon" => Ok(Self::MultiPolygon),
            _ => Err(IsisError::invalid_argument(format!(
                "unknown geometry kind `{}`",
                s
            ))),
        }
    }
}

/// Raw coordinates, by nesting depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinates {
    Position(Position),
    Path(Vec<Position>),
    Rings(Vec<Vec<Position>>),
    Polygons(Vec<Vec<Vec<Position>>>),
}

impl Coordinates {
    /// Zip separate longitude and latitude vectors into a path.
    pub fn from_lon_lat(lon: &[f64], lat: &[f64]) -> IsisResult<Self> {
        if lon.len() != lat.len() {
            return Err(IsisError::invalid_argument(format!(
                "longitude and latitude lengths differ: {} vs {}",
                lon.len(),
                lat.len()
            )));
        }
        Ok(Coordinates::Path(
            lon.iter().zip(lat).map(|(&x, &y)| [x, y]).collect(),
        ))
    }

    fn depth(&self) -> &'static str {
        match self {
            Coordinates::Position(_) => "a position",
            Coordinates::Path(_) => "a path",
            Coordinates::Rings(_) => "a set of rings",
            Coordinates::Polygons(_) => "a set of polygons",
        }
    }
}

/// GeoJSON geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        /// Exterior ring first, then holes.
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

impl Geometry {
    /// Build a geometry of `kind`, rounding coordinates to `precision`.
    ///
    /// A path given for a polygon or a multi line string is taken as its
    /// single ring or line.
    pub fn build(kind: GeometryKind, coordinates: Coordinates, precision: u32) -> IsisResult<Self> {
        use Coordinates as C;
        use GeometryKind as K;

        let geometry = match (kind, coordinates) {
            (K::Point, C::Position(p)) => Geometry::Point {
                coordinates: round_position(p, precision),
            },
            (K::Point, C::Path(path)) if path.len() == 1 => Geometry::Point {
                coordinates: round_position(path[0], precision),
            },
            (K::LineString, C::Path(path)) => Geometry::LineString {
                coordinates: round_path(path, precision),
            },
            (K::MultiPoint, C::Path(path)) => Geometry::MultiPoint {
                coordinates: round_path(path, precision),
            },
            (K::Polygon, C::Path(path)) => Geometry::Polygon {
                coordinates: vec![round_path(path, precision)],
            },
            (K::Polygon, C::Rings(rings)) => Geometry::Polygon {
                coordinates: round_rings(rings, precision),
            },
            (K::MultiLineString, C::Path(path)) => Geometry::MultiLineString {
                coordinates: vec![round_path(path, precision)],
            },
            (K::MultiLineString, C::Rings(lines)) => Geometry::MultiLineString {
                coordinates: round_rings(lines, precision),
            },
            (K::MultiPolygon, C::Polygons(polygons)) => Geometry::MultiPolygon {
                coordinates: polygons
                    .into_iter()
                    .map(|rings| round_rings(rings, precision))
                    .collect(),
            },
            (kind, coordinates) => {
                return Err(IsisError::invalid_argument(format!(
                    "{:?} cannot be built from {}",
                    kind,
                    coordinates.depth()
                )))
            }
        };
        Ok(geometry)
    }

    /// Parse the kind keyword and build.
    pub fn from_keyword(keyword: &str, coordinates: Coordinates, precision: u32) -> IsisResult<Self> {
        Self::build(keyword.parse()?, coordinates, precision)
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point { .. } => GeometryKind::Point,
            Geometry::LineString { .. } => GeometryKind::LineString,
            Geometry::Polygon { .. } => GeometryKind::Polygon,
            Geometry::MultiPoint { .. } => GeometryKind::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryKind::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryKind::MultiPolygon,
        }
    }

    pub fn to_json(&self) -> IsisResult<String> {
        serde_json::to_string(self).map_err(|e| IsisError::invalid_argument(e.to_string()))
    }
}

/// A GeoJSON feature with rounded float properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub properties: Map<String, Value>,

    #[serde(skip)]
    precision: u32,
}

impl Feature {
    pub fn new(geometry: Geometry, precision: u32) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry,
            properties: Map::new(),
            precision,
        }
    }

    /// Add a property. Floats are rounded; non-finite floats become null.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = match value.into() {
            Value::Number(n) if n.is_f64() => n
                .as_f64()
                .map(|f| Value::from(round(f, self.precision)))
                .unwrap_or(Value::Null),
            other => other,
        };
        self.properties.insert(key.into(), value);
        self
    }

    /// Add a float property, skipping it when the value is missing.
    pub fn with_optional(self, key: impl Into<String>, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.with_property(key, v),
            None => self,
        }
    }

    pub fn to_json(&self) -> IsisResult<String> {
        serde_json::to_string(self).map_err(|e| IsisError::invalid_argument(e.to_string()))
    }
}
