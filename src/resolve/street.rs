//! Conversion of transportation-plan features into streets.

use crate::arcgis::Feature;
use crate::error::{Error, Result};
use crate::models::{Classification, Street, UNNAMED_SEGMENT};
use crate::spatial::geometry_midpoint;

/// Build a street from one upstream feature.
///
/// Classification values pass through untouched, absent ones included. A
/// feature without attributes still yields a street carrying only its geometry.
pub fn parse_street(feature: Feature) -> Result<Street> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| Error::MalformedFeature("street feature has no geometry".to_string()))?;

    let midpoint = geometry_midpoint(&geometry)
        .ok_or_else(|| Error::MalformedFeature("street geometry is empty".to_string()))?;

    let mut street = Street {
        id: None,
        name: None,
        geometry,
        midpoint,
        classifications: None,
        block: None,
        width: None,
    };

    if feature.attributes.is_none() {
        return Ok(street);
    }

    street.id = feature.attr_str("TranPlanID");
    street.name = Some(
        feature
            .attr_str("StreetName")
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNNAMED_SEGMENT.to_string()),
    );
    street.classifications = Some(Classification {
        traffic: feature.attr_str("Traffic"),
        transit: feature.attr_str("Transit"),
        bicycle: feature.attr_str("Bicycle"),
        pedestrian: feature.attr_str("Pedestrian"),
        freight: feature.attr_str("Freight"),
        emergency: feature.attr_str("Emergency"),
        design: feature.attr_str("Design"),
        greenscape: feature.attr_str("Greenscape"),
    });

    Ok(street)
}
