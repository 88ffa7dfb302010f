//! Conversion of plan and project features.
//!
//! Features without properties carry nothing to show and are skipped.

use crate::arcgis::Feature;
use crate::models::{AreaPlan, MasterStreetPlan, Project};

pub fn parse_area_plan(feature: &Feature) -> Option<AreaPlan> {
    feature.attributes.as_ref()?;

    Some(AreaPlan {
        id: feature.attr_i64("OBJECTID"),
        name: feature.attr_str("Project_Name"),
        manager: feature.attr_str("Project_Manager"),
        requirements: feature.attr_str("Development_Requirements"),
        adopted: feature.attr_str("Adopted"),
        document: feature.attr_str("HyperLink"),
        bbox: feature.geometry.as_ref().and_then(|g| g.bbox()),
        geometry: feature.geometry.clone(),
    })
}

pub fn parse_master_street_plan(feature: &Feature) -> Option<MasterStreetPlan> {
    feature.attributes.as_ref()?;

    Some(MasterStreetPlan {
        id: feature.attr_i64("OBJECTID"),
        name: feature.attr_str("PlanName"),
        manager: feature.attr_str("Manager"),
        adopted: feature.attr_str("Adopted"),
        document: feature.attr_str("HyperLink"),
        bbox: feature.geometry.as_ref().and_then(|g| g.bbox()),
        geometry: feature.geometry.clone(),
    })
}

pub fn parse_project(feature: &Feature) -> Option<Project> {
    feature.attributes.as_ref()?;

    Some(Project {
        id: feature.attr_str("TranPlanID"),
        name: feature.attr_str("ProjectName"),
        description: feature.attr_str("ProjectDescription"),
        agency: feature.attr_str("Agency"),
        estimated_cost: feature.attr_f64("EstimatedCost"),
        time_frame: feature.attr_str("TimeFrame"),
        bbox: feature.geometry.as_ref().and_then(|g| g.bbox()),
        geometry: feature.geometry.clone(),
    })
}
