//! Query facade over the configured feature services.

use tracing::{debug, info, warn};

use crate::arcgis::{sql_literal, Feature, FeatureClient, FeatureSource, OutputFormat, QueryParams};
use crate::config::Config;
use crate::error::{AttributeResult, Error, Result};
use crate::models::{AreaPlan, BoundingBox, MasterStreetPlan, Project, Street};
use crate::resolve::{
    parse_area_plan, parse_master_street_plan, parse_project, parse_street, resolve_block,
    resolve_width,
};
use crate::spatial::to_wgs84;

/// Which derived attributes to resolve alongside a street.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expand {
    pub block: bool,
    pub width: bool,
}

/// Resolves streets, plans and projects from the upstream services.
///
/// Holds no entity state: every call queries the services afresh.
pub struct Gateway<S> {
    client: FeatureClient<S>,
    config: Config,
}

impl<S: FeatureSource> Gateway<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self {
            client: FeatureClient::new(source),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &FeatureClient<S> {
        &self.client
    }

    /// Streets intersecting a box given in any registered spatial reference.
    ///
    /// `None` when no street layer returned features.
    pub async fn streets_by_bbox(&self, bbox: BoundingBox) -> Result<Option<Vec<Street>>> {
        let bbox = to_wgs84(bbox)?.normalized();
        debug!("Street search in {:?}", bbox.to_array());

        let params = QueryParams::envelope(&bbox, OutputFormat::Json);
        let features = self.client.query_first(&self.config.streets.urls, &params).await?;

        Ok(features.map(parse_streets))
    }

    /// Segments carrying a planning id; several segments may share one.
    pub async fn street_by_id(&self, id: &str) -> Result<Option<Vec<Street>>> {
        let params = QueryParams::filter(format!("TranPlanID={}", sql_literal(id)), OutputFormat::Json);
        let features = self.client.query_first(&self.config.streets.urls, &params).await?;

        Ok(features.map(parse_streets))
    }

    pub async fn block(&self, street: &Street) -> AttributeResult<i64> {
        resolve_block(&self.client, &self.config.attributes.block_url, street).await
    }

    pub async fn width(&self, street: &Street) -> AttributeResult<f64> {
        resolve_width(&self.client, &self.config.attributes.width_url, street).await
    }

    /// Fill in the requested derived attributes, resolving them concurrently.
    ///
    /// Never fails: an attribute that cannot be resolved is stored as unknown.
    pub async fn expand(&self, mut street: Street, expand: Expand) -> Street {
        let block = async {
            if expand.block {
                Some(self.block(&street).await)
            } else {
                None
            }
        };
        let width = async {
            if expand.width {
                Some(self.width(&street).await)
            } else {
                None
            }
        };

        let (block, width) = futures::join!(block, width);
        street.block = block;
        street.width = width;
        street
    }

    pub async fn area_plans_by_bbox(&self, bbox: BoundingBox) -> Result<Vec<AreaPlan>> {
        let params = QueryParams::envelope(&to_wgs84(bbox)?.normalized(), OutputFormat::GeoJson);
        let features = self.client.query_all(&self.config.plans.area_plan_urls, &params).await?;
        Ok(features.iter().filter_map(parse_area_plan).collect())
    }

    pub async fn area_plans_by_id(&self, id: i64) -> Result<Vec<AreaPlan>> {
        let params = QueryParams::filter(format!("OBJECTID={}", id), OutputFormat::GeoJson);
        let features = self.client.query_all(&self.config.plans.area_plan_urls, &params).await?;
        Ok(features.iter().filter_map(parse_area_plan).collect())
    }

    pub async fn master_street_plans_by_bbox(&self, bbox: BoundingBox) -> Result<Vec<MasterStreetPlan>> {
        let params = QueryParams::envelope(&to_wgs84(bbox)?.normalized(), OutputFormat::GeoJson);
        let features = self
            .client
            .query_all(&self.config.plans.master_street_plan_urls, &params)
            .await?;
        Ok(features.iter().filter_map(parse_master_street_plan).collect())
    }

    pub async fn master_street_plans_by_id(&self, id: i64) -> Result<Vec<MasterStreetPlan>> {
        let params = QueryParams::filter(format!("OBJECTID={}", id), OutputFormat::GeoJson);
        let features = self
            .client
            .query_all(&self.config.plans.master_street_plan_urls, &params)
            .await?;
        Ok(features.iter().filter_map(parse_master_street_plan).collect())
    }

    pub async fn projects_by_bbox(&self, bbox: BoundingBox) -> Result<Vec<Project>> {
        let params = QueryParams::envelope(&to_wgs84(bbox)?.normalized(), OutputFormat::GeoJson);
        let features = self.client.query_all(&self.config.plans.project_urls, &params).await?;
        Ok(features.iter().filter_map(parse_project).collect())
    }

    pub async fn projects_by_id(&self, id: &str) -> Result<Vec<Project>> {
        let params = QueryParams::filter(format!("TranPlanID={}", sql_literal(id)), OutputFormat::GeoJson);
        let features = self.client.query_all(&self.config.plans.project_urls, &params).await?;
        Ok(features.iter().filter_map(parse_project).collect())
    }

    pub async fn street_area_plans(&self, street: &Street) -> Result<Vec<AreaPlan>> {
        self.area_plans_by_bbox(street_bbox(street)?).await
    }

    pub async fn street_master_street_plans(&self, street: &Street) -> Result<Vec<MasterStreetPlan>> {
        self.master_street_plans_by_bbox(street_bbox(street)?).await
    }

    pub async fn street_projects(&self, street: &Street) -> Result<Vec<Project>> {
        self.projects_by_bbox(street_bbox(street)?).await
    }

    /// Segments whose geometry meets this street's envelope, itself included.
    pub async fn related_streets(&self, street: &Street) -> Result<Option<Vec<Street>>> {
        self.streets_by_bbox(street_bbox(street)?).await
    }
}

impl Gateway<crate::arcgis::HttpSource> {
    /// Gateway talking to the configured services over HTTP.
    pub fn connect(config: Config) -> anyhow::Result<Self> {
        let source = crate::arcgis::HttpSource::new()?;
        info!(
            "Gateway configured with {} street layers, {} area plan layers",
            config.streets.urls.len(),
            config.plans.area_plan_urls.len()
        );
        Ok(Self::new(source, config))
    }
}

fn street_bbox(street: &Street) -> Result<BoundingBox> {
    street
        .geometry
        .bbox()
        .ok_or_else(|| Error::MalformedFeature("street geometry has no extent".to_string()))
}

// Features that cannot become streets are dropped so one bad record does not
// sink the rest of the answer.
fn parse_streets(features: Vec<Feature>) -> Vec<Street> {
    features
        .into_iter()
        .filter_map(|feature| match parse_street(feature) {
            Ok(street) => Some(street),
            Err(e) => {
                warn!("Skipping street feature: {}", e);
                None
            }
        })
        .collect()
}
