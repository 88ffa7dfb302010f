//! Distances, lengths and midpoints in meters on EPSG:4326 geometries.

use geo::{Centroid, Distance, Haversine, InterpolatePoint, LineString, Point};

use crate::models::Geometry;

/// Great-circle distance between two lon/lat points, in meters.
pub fn distance_meters(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b)
}

/// Length of a line, in meters.
pub fn length_meters(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| distance_meters(segment.start_point(), segment.end_point()))
        .sum()
}

/// Point `meters` along the line from its first vertex.
///
/// Distances past the end clamp to the last vertex. Returns `None` for an empty line.
pub fn along(line: &LineString<f64>, meters: f64) -> Option<Point<f64>> {
    let first = line.points().next()?;
    if meters <= 0.0 {
        return Some(first);
    }

    let mut travelled = 0.0;
    for segment in line.lines() {
        let start = segment.start_point();
        let end = segment.end_point();
        let step = distance_meters(start, end);

        if travelled + step >= meters {
            let remaining = meters - travelled;
            if remaining <= 0.0 {
                return Some(start);
            }
            return Some(Haversine.point_at_distance_between(start, end, remaining));
        }
        travelled += step;
    }

    line.points().last()
}

/// Point at half the arc length of the line.
///
/// A zero-length line (one vertex, or repeated vertices) yields its first vertex.
pub fn midpoint(line: &LineString<f64>) -> Option<Point<f64>> {
    along(line, length_meters(line) / 2.0)
}

/// Representative point used when ranking candidates by distance.
///
/// Lines use their arc-length midpoint, areas their centroid.
pub fn geometry_midpoint(geometry: &Geometry) -> Option<Point<f64>> {
    match geometry {
        Geometry::Point(p) => Some(*p),
        Geometry::LineString(line) => midpoint(line),
        Geometry::Polygon(polygon) => polygon.centroid(),
        Geometry::MultiPolygon(mp) => mp.centroid(),
    }
}
