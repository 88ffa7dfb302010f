//! Canonical geometry and bounding box types.

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Point, Polygon};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// The canonical spatial reference (WGS84 lon/lat).
pub const WGS84: u32 = 4326;

/// Geometry of a resolved feature, always in EPSG:4326 once parsed.
///
/// Values are never mutated after parsing; buffers and midpoints are new values.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
    /// Plan layers return multi-part areas.
    MultiPolygon(MultiPolygon<f64>),
}

impl Geometry {
    /// The envelope of this geometry, tagged as EPSG:4326.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let rect = match self {
            Geometry::Point(p) => Some(p.bounding_rect()),
            Geometry::LineString(l) => l.bounding_rect(),
            Geometry::Polygon(p) => p.bounding_rect(),
            Geometry::MultiPolygon(mp) => mp.bounding_rect(),
        }?;

        Some(BoundingBox {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
            wkid: WGS84,
        })
    }

    /// GeoJSON geometry type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// GeoJSON `coordinates` member.
    pub fn coordinates(&self) -> Value {
        match self {
            Geometry::Point(p) => json!([p.x(), p.y()]),
            Geometry::LineString(l) => ring_json(l),
            Geometry::Polygon(p) => polygon_json(p),
            Geometry::MultiPolygon(mp) => Value::Array(mp.iter().map(polygon_json).collect()),
        }
    }
}

fn ring_json(line: &LineString<f64>) -> Value {
    Value::Array(line.coords().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_json(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![ring_json(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_json));
    Value::Array(rings)
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        json!({
            "type": self.type_name(),
            "coordinates": self.coordinates(),
        })
        .serialize(serializer)
    }
}

/// Bounding box tagged with the spatial reference its corners are expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub wkid: u32,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64, wkid: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            wkid,
        }
    }

    /// Build from a `[minX, minY, maxX, maxY]` slice as supplied by callers.
    pub fn from_slice(values: &[f64], wkid: u32) -> Result<Self> {
        match values {
            [min_x, min_y, max_x, max_y] => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(Error::InvalidBoundingBox(format!(
                        "non-finite coordinate in {:?}",
                        values
                    )));
                }
                Ok(Self::new(*min_x, *min_y, *max_x, *max_y, wkid))
            }
            _ => Err(Error::InvalidBoundingBox(format!(
                "expected 4 values, got {}",
                values.len()
            ))),
        }
    }

    pub fn min(&self) -> Coord<f64> {
        Coord {
            x: self.min_x,
            y: self.min_y,
        }
    }

    pub fn max(&self) -> Coord<f64> {
        Coord {
            x: self.max_x,
            y: self.max_y,
        }
    }

    /// Swap corners so that `min <= max` on both axes.
    pub fn normalized(self) -> Self {
        Self {
            min_x: self.min_x.min(self.max_x),
            min_y: self.min_y.min(self.max_y),
            max_x: self.min_x.max(self.max_x),
            max_y: self.min_y.max(self.max_y),
            wkid: self.wkid,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}
