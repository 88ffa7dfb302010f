//! Feature-service client: ordered fallback and scatter-gather queries.

use std::future::Future;

use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::feature::{decode_features, Feature};
use super::query::QueryParams;
use crate::error::{Error, Result};

const USER_AGENT: &str = "streetgraph/0.1 (feature gateway)";

/// Transport for a single feature-service query.
///
/// `Ok(None)` means the service answered but the payload was not a usable
/// feature collection. Network and HTTP status faults are errors.
pub trait FeatureSource: Send + Sync {
    fn fetch(
        &self,
        service_url: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Option<Vec<Feature>>>> + Send;
}

/// Build `<service>/query?<params>`.
pub fn query_url(service_url: &str, params: &QueryParams) -> Result<Url> {
    let base = format!("{}/query", service_url.trim_end_matches('/'));
    Url::parse_with_params(&base, params.to_pairs()).map_err(|e| Error::UpstreamUnavailable {
        url: service_url.to_string(),
        reason: format!("invalid service URL: {}", e),
    })
}

/// Production source backed by reqwest.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl FeatureSource for HttpSource {
    async fn fetch(&self, service_url: &str, params: &QueryParams) -> Result<Option<Vec<Feature>>> {
        let url = query_url(service_url, params)?;
        let unavailable = |reason: String| Error::UpstreamUnavailable {
            url: service_url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(format!("failed to read response: {}", e)))?;

        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(b) => b,
            Err(e) => {
                warn!("Unparseable response from {}: {}", service_url, e);
                return Ok(None);
            }
        };

        if let Some(error) = body.get("error") {
            warn!("Service {} reported an error: {}", service_url, error);
        }

        Ok(decode_features(&body))
    }
}

/// Runs queries against lists of feature services.
///
/// No caching: every call goes to the services.
#[derive(Clone)]
pub struct FeatureClient<S> {
    source: S,
}

impl<S: FeatureSource> FeatureClient<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query one service; an empty collection is reported as `None`.
    pub async fn query_one(
        &self,
        service_url: &str,
        params: &QueryParams,
    ) -> Result<Option<Vec<Feature>>> {
        let features = self.source.fetch(service_url, params).await?;
        Ok(features.filter(|f| !f.is_empty()))
    }

    /// Try each service in order and return the first non-empty collection.
    ///
    /// Later services are never queried once one answers with features, even if
    /// that answer is wrong for the request. A fault aborts the walk.
    pub async fn query_first(
        &self,
        service_urls: &[String],
        params: &QueryParams,
    ) -> Result<Option<Vec<Feature>>> {
        for url in service_urls {
            match self.query_one(url, params).await? {
                Some(features) => {
                    debug!("{} returned {} features", url, features.len());
                    return Ok(Some(features));
                }
                None => debug!("{} returned no features, trying next service", url),
            }
        }

        Ok(None)
    }

    /// Query every service concurrently and concatenate the results in list order.
    ///
    /// A fault in any service fails the whole call.
    pub async fn query_all(&self, service_urls: &[String], params: &QueryParams) -> Result<Vec<Feature>> {
        let responses = try_join_all(
            service_urls
                .iter()
                .map(|url| self.source.fetch(url, params)),
        )
        .await?;

        Ok(responses.into_iter().flatten().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcgis::mock::{feature, MockSource};
    use crate::arcgis::query::OutputFormat;
    use serde_json::json;

    fn params() -> QueryParams {
        QueryParams::filter("1=1", OutputFormat::Json)
    }

    fn urls(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_query_url_appends_endpoint() {
        let url = query_url("https://example.com/MapServer/15/", &params()).unwrap();
        assert_eq!(url.path(), "/MapServer/15/query");
        assert!(url.query().unwrap().contains("where=1%3D1"));
    }

    #[tokio::test]
    async fn test_first_non_empty_service_wins() {
        let source = MockSource::new()
            .empty("a")
            .malformed("b")
            .features("c", vec![feature(json!({ "id": "c" }), None)])
            .features("d", vec![feature(json!({ "id": "d" }), None)]);
        let client = FeatureClient::new(source);

        let result = client
            .query_first(&urls(&["a", "b", "c", "d"]), &params())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result[0].attr_str("id").as_deref(), Some("c"));
        assert_eq!(client.source().calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_exhausted_list_yields_none() {
        let client = FeatureClient::new(MockSource::new().empty("a").empty("b"));
        let result = client.query_first(&urls(&["a", "b"]), &params()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fault_is_fatal_for_fallback() {
        let client = FeatureClient::new(
            MockSource::new()
                .failing("a")
                .features("b", vec![feature(json!({}), None)]),
        );
        let result = client.query_first(&urls(&["a", "b"]), &params()).await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_scatter_gather_concatenates_in_order() {
        let client = FeatureClient::new(
            MockSource::new()
                .features("a", vec![feature(json!({ "n": 1 }), None)])
                .empty("b")
                .features("c", vec![feature(json!({ "n": 2 }), None), feature(json!({ "n": 3 }), None)]),
        );

        let all = client.query_all(&urls(&["a", "b", "c"]), &params()).await.unwrap();
        let ns: Vec<i64> = all.iter().filter_map(|f| f.attr_i64("n")).collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_scatter_gather_fails_when_any_service_faults() {
        let client = FeatureClient::new(
            MockSource::new()
                .features("a", vec![feature(json!({ "n": 1 }), None)])
                .failing("b")
                .features("c", vec![feature(json!({ "n": 2 }), None)]),
        );

        let result = client.query_all(&urls(&["a", "b", "c"]), &params()).await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
    }

    /// Serve canned feature-service responses on an ephemeral local port.
    async fn spawn_service() -> String {
        use axum::{extract::RawQuery, http::StatusCode, routing::get, Json, Router};

        let app = Router::new()
            .route(
                "/streets/query",
                get(|RawQuery(query): RawQuery| async move {
                    let query = query.unwrap_or_default();
                    if !query.contains("f=json") || !query.contains("outSR=4326") {
                        return Json(json!({ "features": [] }));
                    }
                    Json(json!({
                        "features": [{
                            "attributes": { "TranPlanID": "11234" },
                            "geometry": { "paths": [[[-122.668, 45.515], [-122.662, 45.515]]] }
                        }]
                    }))
                }),
            )
            .route(
                "/down/query",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
            )
            .route("/garbled/query", get(|| async { "<html>proxy error</html>" }))
            .route(
                "/refused/query",
                get(|| async { Json(json!({ "error": { "code": 400, "message": "Invalid query" } })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_source_decodes_features() {
        let base = spawn_service().await;
        let source = HttpSource::new().unwrap();

        let features = source
            .fetch(&format!("{}/streets", base), &params())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].attr_str("TranPlanID").as_deref(), Some("11234"));
        assert!(features[0].geometry.is_some());
    }

    #[tokio::test]
    async fn test_http_status_fault_is_unavailable() {
        let base = spawn_service().await;
        let source = HttpSource::new().unwrap();

        let result = source.fetch(&format!("{}/down", base), &params()).await;
        match result {
            Err(Error::UpstreamUnavailable { url, reason }) => {
                assert!(url.ends_with("/down"));
                assert!(reason.contains("503"));
            }
            other => panic!("expected UpstreamUnavailable, got {:?}", other.map(|f| f.map(|f| f.len()))),
        }
    }

    #[tokio::test]
    async fn test_unusable_bodies_yield_none() {
        let base = spawn_service().await;
        let source = HttpSource::new().unwrap();

        let garbled = source.fetch(&format!("{}/garbled", base), &params()).await.unwrap();
        assert!(garbled.is_none());

        let refused = source.fetch(&format!("{}/refused", base), &params()).await.unwrap();
        assert!(refused.is_none());
    }

    #[tokio::test]
    async fn test_http_fallback_skips_unusable_services() {
        let base = spawn_service().await;
        let client = FeatureClient::new(HttpSource::new().unwrap());
        let services = vec![
            format!("{}/garbled", base),
            format!("{}/refused", base),
            format!("{}/streets", base),
        ];

        let features = client.query_first(&services, &params()).await.unwrap().unwrap();
        assert_eq!(features.len(), 1);
    }
}
