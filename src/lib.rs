//! Streetgraph - read-only street and plan resolution over ArcGIS feature services
//!
//! The library turns City of Portland transportation layers into street, plan and
//! project entities, deriving block numbers and street widths on demand. The
//! server binary exposes it over HTTP.

pub mod arcgis;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod resolve;
pub mod spatial;

pub use config::Config;
pub use error::{AttributeResult, Error, Result, Unknown};
pub use gateway::{Expand, Gateway};
pub use models::{AreaPlan, BoundingBox, Geometry, MasterStreetPlan, Project, Street};
