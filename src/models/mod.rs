//! Entity types produced by the gateway.

pub mod geometry;
pub mod plan;
pub mod street;

pub use geometry::{BoundingBox, Geometry, WGS84};
pub use plan::{AreaPlan, MasterStreetPlan, Project};
pub use street::{Classification, Street, UNNAMED_SEGMENT};
