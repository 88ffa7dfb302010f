//! In-memory feature source for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::client::FeatureSource;
use super::feature::Feature;
use super::query::QueryParams;
use crate::error::{Error, Result};
use crate::models::Geometry;

#[derive(Debug, Clone)]
enum Response {
    Features(Vec<Feature>),
    Empty,
    Malformed,
    Fail,
}

/// Canned answers keyed by service URL; unknown URLs answer empty.
#[derive(Default)]
pub struct MockSource {
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<(String, QueryParams)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, url: &str, response: Response) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn features(self, url: &str, features: Vec<Feature>) -> Self {
        self.with(url, Response::Features(features))
    }

    pub fn empty(self, url: &str) -> Self {
        self.with(url, Response::Empty)
    }

    pub fn malformed(self, url: &str) -> Self {
        self.with(url, Response::Malformed)
    }

    pub fn failing(self, url: &str) -> Self {
        self.with(url, Response::Fail)
    }

    /// URLs queried so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }

    pub fn requests(&self) -> Vec<(String, QueryParams)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl FeatureSource for MockSource {
    async fn fetch(&self, service_url: &str, params: &QueryParams) -> Result<Option<Vec<Feature>>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((service_url.to_string(), params.clone()));
        }

        match self.responses.get(service_url) {
            Some(Response::Features(features)) => Ok(Some(features.clone())),
            Some(Response::Malformed) => Ok(None),
            Some(Response::Fail) => Err(Error::UpstreamUnavailable {
                url: service_url.to_string(),
                reason: "connection refused".to_string(),
            }),
            Some(Response::Empty) | None => Ok(Some(Vec::new())),
        }
    }
}

/// Build a feature from a JSON attribute object.
pub fn feature(attributes: Value, geometry: Option<Geometry>) -> Feature {
    Feature::new(attributes.as_object().cloned(), geometry)
}
