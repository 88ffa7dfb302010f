//! Plan and project entities related to streets by bounding box.

use serde::Serialize;

use super::{BoundingBox, Geometry};

/// A documented plan for a section of the city's streets.
#[derive(Debug, Clone, Serialize)]
pub struct AreaPlan {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub manager: Option<String>,
    pub requirements: Option<String>,
    /// Year the plan was adopted
    pub adopted: Option<String>,
    /// URL of the plan document
    pub document: Option<String>,
    pub geometry: Option<Geometry>,
    pub bbox: Option<BoundingBox>,
}

/// A master street plan area.
#[derive(Debug, Clone, Serialize)]
pub struct MasterStreetPlan {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub manager: Option<String>,
    pub adopted: Option<String>,
    pub document: Option<String>,
    pub geometry: Option<Geometry>,
    pub bbox: Option<BoundingBox>,
}

/// A Transportation System Plan project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub agency: Option<String>,
    pub estimated_cost: Option<f64>,
    pub time_frame: Option<String>,
    pub geometry: Option<Geometry>,
    pub bbox: Option<BoundingBox>,
}
