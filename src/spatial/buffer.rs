//! Metric buffering of EPSG:4326 geometries.
//!
//! Geometries are projected onto a local equirectangular plane centered on
//! their envelope, dilated there in meters, and projected back. Over the
//! extent of a street segment the distortion is well below a centimeter.

use geo::{Area, Buffer, Coord, LineString, MapCoords, MultiPolygon, Point, Polygon};

use crate::error::{Error, Result};
use crate::models::Geometry;

/// Mean Earth radius in meters, matching the haversine measurements.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Local tangent plane around an origin, in meters.
struct LocalPlane {
    origin: Coord<f64>,
    cos_lat: f64,
}

impl LocalPlane {
    fn new(origin: Coord<f64>) -> Self {
        Self {
            origin,
            cos_lat: origin.y.to_radians().cos(),
        }
    }

    fn forward(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.origin.x).to_radians() * EARTH_RADIUS_M * self.cos_lat,
            y: (c.y - self.origin.y).to_radians() * EARTH_RADIUS_M,
        }
    }

    fn inverse(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + (c.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            y: self.origin.y + (c.y / EARTH_RADIUS_M).to_degrees(),
        }
    }
}

fn is_degenerate(line: &LineString<f64>) -> bool {
    line.coords().all(|c| Some(c) == line.coords().next())
}

/// Dilate `geometry` by `meters` and return the resulting area.
///
/// The distance must be finite and strictly positive; zero and negative
/// distances are rejected with [`Error::InvalidBuffer`]. A zero-length line is
/// buffered as the single point it collapses to.
pub fn buffer_meters(geometry: &Geometry, meters: f64) -> Result<Polygon<f64>> {
    if !meters.is_finite() || meters <= 0.0 {
        return Err(Error::InvalidBuffer(meters));
    }

    let origin = geometry
        .bbox()
        .map(|b| Coord {
            x: (b.min_x + b.max_x) / 2.0,
            y: (b.min_y + b.max_y) / 2.0,
        })
        .ok_or_else(|| Error::MalformedFeature("cannot buffer an empty geometry".to_string()))?;
    let plane = LocalPlane::new(origin);

    let dilated: MultiPolygon<f64> = match geometry {
        Geometry::Point(p) => p.map_coords(|c| plane.forward(c)).buffer(meters),
        Geometry::LineString(line) if is_degenerate(line) => {
            let only = line.0[0];
            Point::from(plane.forward(only)).buffer(meters)
        }
        Geometry::LineString(line) => line.map_coords(|c| plane.forward(c)).buffer(meters),
        Geometry::Polygon(polygon) => polygon.map_coords(|c| plane.forward(c)).buffer(meters),
        Geometry::MultiPolygon(mp) => mp.map_coords(|c| plane.forward(c)).buffer(meters),
    };

    // A single connected input dilates to one part; keep the largest if not.
    let largest = dilated
        .into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .ok_or_else(|| Error::MalformedFeature("buffer produced no area".to_string()))?;

    Ok(largest.map_coords(|c| plane.inverse(c)))
}
