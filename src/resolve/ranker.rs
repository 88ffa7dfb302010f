//! Nearest-midpoint disambiguation of same-named candidates.

use geo::Point;

use crate::arcgis::Feature;
use crate::models::Geometry;
use crate::spatial::{distance_meters, geometry_midpoint};

/// What a candidate is matched against.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub name: &'a str,
    pub midpoint: Point<f64>,
}

/// An upstream record considered during one resolution call.
#[derive(Debug, Clone)]
pub struct FeatureCandidate {
    pub name: String,
    pub geometry: Geometry,
    pub feature: Feature,
}

impl FeatureCandidate {
    /// Wrap a feature, reading its name from `name_field`.
    ///
    /// Features lacking the name or a geometry cannot be ranked and yield `None`.
    pub fn from_feature(feature: Feature, name_field: &str) -> Option<Self> {
        let name = feature.attr_str(name_field)?;
        let geometry = feature.geometry.clone()?;
        Some(Self {
            name,
            geometry,
            feature,
        })
    }
}

/// A candidate with its midpoint distance to the target.
#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a> {
    pub candidate: &'a FeatureCandidate,
    pub distance_m: f64,
}

/// Name-matching candidates ordered by midpoint distance, nearest first.
///
/// A candidate matches when its name is a case-sensitive prefix of the target
/// name: attribute sources often shorten "SW Main St" to "SW Main". The sort is
/// stable, so equidistant candidates keep their upstream order.
pub fn rank<'a>(target: &Target<'_>, candidates: &'a [FeatureCandidate]) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = candidates
        .iter()
        .filter(|c| target.name.starts_with(c.name.as_str()))
        .filter_map(|c| {
            let midpoint = geometry_midpoint(&c.geometry)?;
            Some(Ranked {
                candidate: c,
                distance_m: distance_meters(target.midpoint, midpoint),
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    ranked
}

/// The nearest name-matching candidate, if any.
pub fn disambiguate<'a>(
    target: &Target<'_>,
    candidates: &'a [FeatureCandidate],
) -> Option<&'a FeatureCandidate> {
    rank(target, candidates).first().map(|r| r.candidate)
}
