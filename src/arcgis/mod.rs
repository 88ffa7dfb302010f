//! ArcGIS REST feature-service access.

mod client;
mod feature;
#[cfg(test)]
pub(crate) mod mock;
mod query;

pub use client::{query_url, FeatureClient, FeatureSource, HttpSource};
pub use feature::{decode_features, decode_geometry, Feature};
pub use query::{esri_geometry, esri_geometry_type, sql_literal, OutputFormat, QueryParams, SpatialRel};
