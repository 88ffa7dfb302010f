//! Decoding of ArcGIS feature sets (`f=json`) and GeoJSON collections (`f=geojson`).

use geo::{Coord, LineString, MultiPolygon, Point, Polygon, Winding};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::Geometry;

/// One upstream record: an attribute map and an optional geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub attributes: Option<Map<String, Value>>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new(attributes: Option<Map<String, Value>>, geometry: Option<Geometry>) -> Self {
        Self {
            attributes,
            geometry,
        }
    }

    /// Raw attribute value, `None` when absent or null.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes
            .as_ref()?
            .get(key)
            .filter(|v| !v.is_null())
    }

    /// Attribute as text; numbers and booleans are rendered, not rejected.
    pub fn attr_str(&self, key: &str) -> Option<String> {
        match self.attr(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Attribute as a number; numeric strings are accepted.
    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        match self.attr(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        match self.attr(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireFeature {
    #[serde(alias = "properties")]
    attributes: Option<Map<String, Value>>,
    geometry: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Point { coordinates: Vec<f64> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireGeometry {
    GeoJson(GeoJsonGeometry),
    EsriPoint { x: f64, y: f64 },
    EsriPolyline { paths: Vec<Vec<Vec<f64>>> },
    EsriPolygon { rings: Vec<Vec<Vec<f64>>> },
}

/// Extract the features of a response body.
///
/// Returns `None` when the body carries no `features` array, which is how
/// ArcGIS reports query errors with an HTTP 200.
pub fn decode_features(body: &Value) -> Option<Vec<Feature>> {
    let features = body.get("features")?.as_array()?;

    let decoded = features
        .iter()
        .filter_map(|raw| match WireFeature::deserialize(raw) {
            Ok(wire) => Some(Feature {
                attributes: wire.attributes,
                geometry: wire.geometry.as_ref().and_then(decode_geometry),
            }),
            Err(e) => {
                debug!("Skipping undecodable feature: {}", e);
                None
            }
        })
        .collect();

    Some(decoded)
}

/// Decode either a GeoJSON or an ArcGIS geometry object.
pub fn decode_geometry(raw: &Value) -> Option<Geometry> {
    let wire = match WireGeometry::deserialize(raw) {
        Ok(w) => w,
        Err(e) => {
            debug!("Unrecognized geometry encoding: {}", e);
            return None;
        }
    };

    match wire {
        WireGeometry::GeoJson(GeoJsonGeometry::Point { coordinates }) => {
            coord(&coordinates).map(|c| Geometry::Point(Point::from(c)))
        }
        WireGeometry::GeoJson(GeoJsonGeometry::LineString { coordinates }) => {
            Some(Geometry::LineString(line(&coordinates)))
        }
        WireGeometry::GeoJson(GeoJsonGeometry::MultiLineString { coordinates }) => {
            Some(Geometry::LineString(join_paths(&coordinates)))
        }
        WireGeometry::GeoJson(GeoJsonGeometry::Polygon { coordinates }) => {
            polygon(&coordinates).map(Geometry::Polygon)
        }
        WireGeometry::GeoJson(GeoJsonGeometry::MultiPolygon { coordinates }) => {
            let polygons: Vec<Polygon<f64>> = coordinates.iter().filter_map(|p| polygon(p)).collect();
            Some(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        WireGeometry::EsriPoint { x, y } => Some(Geometry::Point(Point::new(x, y))),
        WireGeometry::EsriPolyline { paths } => Some(Geometry::LineString(join_paths(&paths))),
        WireGeometry::EsriPolygon { rings } => esri_rings(&rings),
    }
}

// Extra ordinates (z, m) are dropped.
fn coord(values: &[f64]) -> Option<Coord<f64>> {
    match values {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn line(values: &[Vec<f64>]) -> LineString<f64> {
    LineString::new(values.iter().filter_map(|c| coord(c)).collect())
}

/// Concatenate the parts of a multi-part line into one line.
fn join_paths(paths: &[Vec<Vec<f64>>]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::new();
    for path in paths {
        for c in path.iter().filter_map(|c| coord(c)) {
            if coords.last() != Some(&c) {
                coords.push(c);
            }
        }
    }
    LineString::new(coords)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        line(exterior),
        interiors.iter().map(|r| line(r)).collect(),
    ))
}

/// ArcGIS polygons list every ring flat: clockwise rings are exteriors and
/// counter-clockwise rings are holes of the exterior before them.
fn esri_rings(rings: &[Vec<Vec<f64>>]) -> Option<Geometry> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let mut ring = line(ring);
        ring.close();
        if ring.is_ccw() && !polygons.is_empty() {
            if let Some((_, holes)) = polygons.last_mut() {
                holes.push(ring);
            }
        } else {
            polygons.push((ring, Vec::new()));
        }
    }

    let mut polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}
