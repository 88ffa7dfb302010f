//! Geometry utilities: reprojection, measurement and buffering.
//!
//! All functions are pure and operate on EPSG:4326 unless noted.

pub mod buffer;
pub mod measure;
pub mod reproject;

pub use buffer::buffer_meters;
pub use measure::{distance_meters, geometry_midpoint, length_meters, midpoint};
pub use reproject::{is_supported, reproject, reproject_bbox, to_wgs84};
