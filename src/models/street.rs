//! Street segment entity.

use geo::Point;
use serde::{Serialize, Serializer};

use super::Geometry;
use crate::error::AttributeResult;

/// Name given to segments whose upstream name is absent or blank.
pub const UNNAMED_SEGMENT: &str = "Unnamed segment";

/// Transportation System Plan classifications, copied verbatim from upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub traffic: Option<String>,
    pub transit: Option<String>,
    pub bicycle: Option<String>,
    pub pedestrian: Option<String>,
    pub freight: Option<String>,
    pub emergency: Option<String>,
    pub design: Option<String>,
    pub greenscape: Option<String>,
}

/// A street segment with a planning id from the Transportation System Plan.
///
/// Built fresh for every query. `block` and `width` stay `None` until a caller
/// asks for them; a lookup that ran but found nothing holds `Some(Err(_))`.
#[derive(Debug, Clone, Serialize)]
pub struct Street {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub geometry: Geometry,

    #[serde(serialize_with = "serialize_point")]
    pub midpoint: Point<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifications: Option<Classification>,

    /// Block number derived from the address-range service
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_attribute"
    )]
    pub block: Option<AttributeResult<i64>>,

    /// Street width in feet derived from the asset service
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_attribute"
    )]
    pub width: Option<AttributeResult<f64>>,
}

impl Street {
    /// Value of the block number if it was looked up and found.
    pub fn block_number(&self) -> Option<i64> {
        self.block.as_ref().and_then(|r| r.as_ref().ok().copied())
    }

    /// Width in feet if it was looked up and found.
    pub fn width_feet(&self) -> Option<f64> {
        self.width.as_ref().and_then(|r| r.as_ref().ok().copied())
    }
}

fn serialize_point<S: Serializer>(point: &Point<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    Geometry::Point(*point).serialize(serializer)
}

// An unknown attribute is rendered as null.
fn serialize_attribute<T: Serialize, S: Serializer>(
    value: &Option<AttributeResult<T>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(Ok(v)) => v.serialize(serializer),
        _ => serializer.serialize_none(),
    }
}
