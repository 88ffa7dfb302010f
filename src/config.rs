//! Upstream service configuration.
//!
//! Every section is optional in the TOML file; missing sections fall back to
//! the City of Portland services.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

const PBOT_PLANNING: &str = "https://www.portlandmaps.com/arcgis/rest/services/Public/PBOT_Planning/MapServer";
const TSP_AREA_PLANS: &str =
    "https://services.arcgis.com/quVN97tn06YNGj9s/ArcGIS/rest/services/TSP_Area_Plans_Map5_WFL1/FeatureServer";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub streets: StreetServices,
    pub attributes: AttributeServices,
    pub plans: PlanServices,
}

/// Transportation-plan street layers, tried in order.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StreetServices {
    pub urls: Vec<String>,
}

impl Default for StreetServices {
    fn default() -> Self {
        Self {
            urls: [15, 16, 22, 24, 27, 31]
                .iter()
                .map(|layer| format!("{}/{}", PBOT_PLANNING, layer))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AttributeServices {
    /// Street centerlines with address ranges
    pub block_url: String,
    /// Street assets with curb-to-curb width
    pub width_url: String,
}

impl Default for AttributeServices {
    fn default() -> Self {
        Self {
            block_url: "https://www.portlandmaps.com/arcgis/rest/services/Public/COP_OpenData_Transportation/MapServer/68".to_string(),
            width_url: "https://www.portlandmaps.com/arcgis/rest/services/Public/PBOT_Assets/MapServer/139".to_string(),
        }
    }
}

/// Plan and project layers, queried concurrently.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlanServices {
    pub area_plan_urls: Vec<String>,
    pub master_street_plan_urls: Vec<String>,
    pub project_urls: Vec<String>,
}

impl Default for PlanServices {
    fn default() -> Self {
        Self {
            area_plan_urls: (0..3).map(|layer| format!("{}/{}", TSP_AREA_PLANS, layer)).collect(),
            master_street_plan_urls: Vec::new(),
            project_urls: Vec::new(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every configured service is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let all = self
            .streets
            .urls
            .iter()
            .chain([&self.attributes.block_url, &self.attributes.width_url])
            .chain(&self.plans.area_plan_urls)
            .chain(&self.plans.master_street_plan_urls)
            .chain(&self.plans.project_urls);

        for raw in all {
            let url = Url::parse(raw).with_context(|| format!("Invalid service URL: {}", raw))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("Service URL must be http(s): {}", raw);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.streets.urls.len(), 6);
        assert!(config.streets.urls[0].ends_with("/MapServer/15"));
        assert_eq!(config.plans.area_plan_urls.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [plans]
            master_street_plan_urls = ["https://gis.example.org/arcgis/rest/services/MSP/FeatureServer/0"]
            "#,
        )
        .unwrap();

        assert_eq!(config.plans.master_street_plan_urls.len(), 1);
        assert_eq!(config.plans.area_plan_urls.len(), 3);
        assert_eq!(config.streets.urls, StreetServices::default().urls);
    }

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(Config::from_toml("[streets]\nurls = [\"not a url\"]").is_err());
        assert!(Config::from_toml("[attributes]\nblock_url = \"ftp://example.org/x\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[attributes]\nwidth_url = \"http://localhost:8080/widths\"").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.attributes.width_url, "http://localhost:8080/widths");
        assert_eq!(config.attributes.block_url, AttributeServices::default().block_url);
    }
}
