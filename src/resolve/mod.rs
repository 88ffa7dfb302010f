//! Entity resolution: parsing, ranking and derived attributes.

pub mod attributes;
pub mod plans;
pub mod ranker;
pub mod street;

pub use attributes::{resolve_block, resolve_width};
pub use plans::{parse_area_plan, parse_master_street_plan, parse_project};
pub use ranker::{disambiguate, rank, FeatureCandidate, Ranked, Target};
pub use street::parse_street;
