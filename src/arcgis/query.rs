//! Parameters of an ArcGIS REST `/query` request.

use geo::{LineString, Polygon};
use serde_json::{json, Value};

use crate::models::{BoundingBox, Geometry, WGS84};

/// Response encoding requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// ArcGIS feature set (`attributes` + esri geometry)
    Json,
    GeoJson,
}

impl OutputFormat {
    fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::GeoJson => "geojson",
        }
    }
}

/// Spatial relationship operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRel {
    Intersects,
    EnvelopeIntersects,
}

impl SpatialRel {
    fn as_str(&self) -> &'static str {
        match self {
            SpatialRel::Intersects => "esriSpatialRelIntersects",
            SpatialRel::EnvelopeIntersects => "esriSpatialRelEnvelopeIntersects",
        }
    }
}

/// A feature-service query. Geometry inputs and outputs are always EPSG:4326.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub format: OutputFormat,
    pub where_clause: Option<String>,
    pub geometry: Option<String>,
    pub geometry_type: Option<&'static str>,
    pub spatial_rel: Option<SpatialRel>,
    pub out_fields: String,
}

impl QueryParams {
    fn base(format: OutputFormat) -> Self {
        Self {
            format,
            where_clause: None,
            geometry: None,
            geometry_type: None,
            spatial_rel: None,
            out_fields: "*".to_string(),
        }
    }

    /// Features intersecting an envelope already in EPSG:4326.
    pub fn envelope(bbox: &BoundingBox, format: OutputFormat) -> Self {
        Self {
            geometry: Some(esri_envelope(bbox)),
            geometry_type: Some("esriGeometryEnvelope"),
            spatial_rel: Some(SpatialRel::Intersects),
            ..Self::base(format)
        }
    }

    /// Features related to an arbitrary geometry.
    pub fn geometry(geometry: &Geometry, rel: SpatialRel, format: OutputFormat) -> Self {
        Self {
            geometry: Some(esri_geometry(geometry)),
            geometry_type: Some(esri_geometry_type(geometry)),
            spatial_rel: Some(rel),
            ..Self::base(format)
        }
    }

    /// Features matching an attribute filter.
    pub fn filter(clause: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            where_clause: Some(clause.into()),
            ..Self::base(format)
        }
    }

    pub fn with_out_fields(mut self, fields: &str) -> Self {
        self.out_fields = fields.to_string();
        self
    }

    /// Query-string pairs in the order the service documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("f", self.format.as_str().to_string())];

        if let Some(clause) = &self.where_clause {
            pairs.push(("where", clause.clone()));
        }
        if let Some(geometry_type) = self.geometry_type {
            pairs.push(("geometryType", geometry_type.to_string()));
        }
        if let Some(geometry) = &self.geometry {
            pairs.push(("geometry", geometry.clone()));
        }
        if let Some(rel) = self.spatial_rel {
            pairs.push(("spatialRel", rel.as_str().to_string()));
        }
        if self.geometry.is_some() {
            pairs.push(("inSR", WGS84.to_string()));
        }
        pairs.push(("outSR", WGS84.to_string()));
        pairs.push(("outFields", self.out_fields.clone()));

        pairs
    }
}

/// Quote a string literal for a where clause.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `minx,miny,maxx,maxy`
pub fn esri_envelope(bbox: &BoundingBox) -> String {
    format!("{},{},{},{}", bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y)
}

pub fn esri_geometry_type(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "esriGeometryPoint",
        Geometry::LineString(_) => "esriGeometryPolyline",
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => "esriGeometryPolygon",
    }
}

fn path(line: &LineString<f64>) -> Value {
    Value::Array(line.coords().map(|c| json!([c.x, c.y])).collect())
}

fn rings(polygon: &Polygon<f64>) -> Vec<Value> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(path)
        .collect()
}

/// Encode a geometry in the ArcGIS REST input form.
pub fn esri_geometry(geometry: &Geometry) -> String {
    match geometry {
        Geometry::Point(p) => format!("{},{}", p.x(), p.y()),
        Geometry::LineString(line) => json!({ "paths": [path(line)] }).to_string(),
        Geometry::Polygon(polygon) => json!({ "rings": rings(polygon) }).to_string(),
        Geometry::MultiPolygon(mp) => {
            let all: Vec<Value> = mp.iter().flat_map(rings).collect();
            json!({ "rings": all }).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn value<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_envelope_query_pairs() {
        let bbox = BoundingBox::new(-122.68, 45.5, -122.65, 45.53, WGS84);
        let pairs = QueryParams::envelope(&bbox, OutputFormat::Json).to_pairs();

        assert_eq!(value(&pairs, "f"), Some("json"));
        assert_eq!(value(&pairs, "geometry"), Some("-122.68,45.5,-122.65,45.53"));
        assert_eq!(value(&pairs, "geometryType"), Some("esriGeometryEnvelope"));
        assert_eq!(value(&pairs, "spatialRel"), Some("esriSpatialRelIntersects"));
        assert_eq!(value(&pairs, "inSR"), Some("4326"));
        assert_eq!(value(&pairs, "outSR"), Some("4326"));
        assert_eq!(value(&pairs, "outFields"), Some("*"));
    }

    #[test]
    fn test_filter_query_has_no_geometry() {
        let pairs = QueryParams::filter("TranPlanID='1'", OutputFormat::Json).to_pairs();
        assert_eq!(value(&pairs, "where"), Some("TranPlanID='1'"));
        assert!(value(&pairs, "geometry").is_none());
        assert!(value(&pairs, "inSR").is_none());
    }

    #[test]
    fn test_polyline_encoding() {
        let geometry = Geometry::LineString(line_string![(x: -122.68, y: 45.51), (x: -122.67, y: 45.52)]);
        assert_eq!(esri_geometry_type(&geometry), "esriGeometryPolyline");

        let encoded: Value = serde_json::from_str(&esri_geometry(&geometry)).unwrap();
        assert_eq!(encoded, json!({ "paths": [[[-122.68, 45.51], [-122.67, 45.52]]] }));
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("O'Neil"), "'O''Neil'");
        assert_eq!(sql_literal("11234"), "'11234'");
    }
}
