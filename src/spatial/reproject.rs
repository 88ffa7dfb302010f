//! Reprojection between caller spatial references and EPSG:4326.

use geo::Coord;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{Error, Result};
use crate::models::{BoundingBox, WGS84};

const WEB_MERCATOR: u32 = 3857;

/// A registered spatial reference.
struct Reference {
    wkid: u32,
    definition: &'static str,
    /// Coordinates are degrees of lon/lat (proj4rs works in radians for these).
    geographic: bool,
}

const REFERENCES: &[Reference] = &[
    Reference {
        wkid: WGS84,
        definition: "+proj=longlat +datum=WGS84 +no_defs",
        geographic: true,
    },
    Reference {
        wkid: WEB_MERCATOR,
        definition: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +no_defs",
        geographic: false,
    },
    // NAD83(HARN) / Oregon North (ft), used by the City's GIS layers
    Reference {
        wkid: 2913,
        definition: "+proj=lcc +lat_1=46 +lat_2=44.33333333333334 +lat_0=43.66666666666666 +lon_0=-120.5 +x_0=2500000.0001424 +y_0=0 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=ft +no_defs",
        geographic: false,
    },
];

/// ESRI well-known ids that name Web Mercator.
fn canonical_wkid(wkid: u32) -> u32 {
    match wkid {
        102100 | 102113 | 900913 => WEB_MERCATOR,
        other => other,
    }
}

fn lookup(wkid: u32) -> Result<&'static Reference> {
    let canonical = canonical_wkid(wkid);
    REFERENCES
        .iter()
        .find(|r| r.wkid == canonical)
        .ok_or(Error::UnsupportedReference { wkid })
}

/// Returns true when `wkid` names a registered spatial reference.
pub fn is_supported(wkid: u32) -> bool {
    lookup(wkid).is_ok()
}

/// Transform a single coordinate from `from` to `to`.
///
/// Identical references (including ESRI aliases) return the input unchanged
/// without consulting the registry, so an unregistered wkid maps onto itself.
pub fn reproject(point: Coord<f64>, from: u32, to: u32) -> Result<Coord<f64>> {
    if canonical_wkid(from) == canonical_wkid(to) {
        return Ok(point);
    }

    let source = lookup(from)?;
    let target = lookup(to)?;

    let src = Proj::from_proj_string(source.definition)
        .map_err(|e| Error::Projection(format!("wkid {}: {:?}", from, e)))?;
    let dst = Proj::from_proj_string(target.definition)
        .map_err(|e| Error::Projection(format!("wkid {}: {:?}", to, e)))?;

    let mut p = if source.geographic {
        (point.x.to_radians(), point.y.to_radians(), 0.0)
    } else {
        (point.x, point.y, 0.0)
    };

    transform(&src, &dst, &mut p).map_err(|e| {
        Error::Projection(format!(
            "({}, {}) from {} to {}: {:?}",
            point.x, point.y, from, to, e
        ))
    })?;

    if target.geographic {
        Ok(Coord {
            x: p.0.to_degrees(),
            y: p.1.to_degrees(),
        })
    } else {
        Ok(Coord { x: p.0, y: p.1 })
    }
}

/// Reproject both corners of a bounding box independently into `to`.
///
/// A box already in `to` comes back untouched; a transformed box is normalized.
pub fn reproject_bbox(bbox: BoundingBox, to: u32) -> Result<BoundingBox> {
    if canonical_wkid(bbox.wkid) == canonical_wkid(to) {
        return Ok(BoundingBox { wkid: to, ..bbox });
    }

    let min = reproject(bbox.min(), bbox.wkid, to)?;
    let max = reproject(bbox.max(), bbox.wkid, to)?;

    Ok(BoundingBox::new(min.x, min.y, max.x, max.y, to).normalized())
}

/// Bring a caller-supplied box into EPSG:4326.
pub fn to_wgs84(bbox: BoundingBox) -> Result<BoundingBox> {
    reproject_bbox(bbox, WGS84)
}
