//! HTTP handlers over the gateway.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use streetgraph::arcgis::HttpSource;
use streetgraph::models::WGS84;
use streetgraph::spatial::is_supported;
use streetgraph::{BoundingBox, Error, Expand, Gateway, Street};

/// Application state shared across handlers
pub struct AppState {
    pub gateway: Gateway<HttpSource>,
}

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct BboxParams {
    /// Bounding box: "minX,minY,maxX,maxY"
    bbox: String,
    /// wkid of the bbox coordinates (defaults to 4326)
    #[serde(rename = "spatialReference")]
    spatial_reference: Option<u32>,
}

#[derive(Deserialize)]
pub struct ExpandParams {
    /// Derived attributes to resolve (comma-separated: block, width)
    expand: Option<String>,
}

#[derive(Serialize)]
pub struct Listing<T> {
    count: usize,
    features: Vec<T>,
}

impl<T> Listing<T> {
    fn new(features: Vec<T>) -> Json<Self> {
        Json(Self {
            count: features.len(),
            features,
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    street_layers: usize,
    area_plan_layers: usize,
    master_street_plan_layers: usize,
    project_layers: usize,
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UnsupportedReference { .. } | Error::InvalidBoundingBox(_) | Error::Projection(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::UpstreamUnavailable { .. } | Error::MalformedFeature(_) => StatusCode::BAD_GATEWAY,
        Error::InvalidBuffer(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: Error) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Rejected request: {}", err);
    }
    (status, err.to_string())
}

fn not_found(what: &str, id: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} {} not found", what, id))
}

/// Parse bbox string "minX,minY,maxX,maxY" in the given spatial reference
fn parse_bbox(bbox: &str, wkid: Option<u32>) -> Result<BoundingBox, Error> {
    let wkid = wkid.unwrap_or(WGS84);
    if !is_supported(wkid) {
        return Err(Error::UnsupportedReference { wkid });
    }

    let values = bbox
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| Error::InvalidBoundingBox(format!("{}: {}", bbox, e)))?;
    BoundingBox::from_slice(&values, wkid)
}

fn parse_expand(expand: Option<&str>) -> Result<Expand, ApiError> {
    let mut parsed = Expand::default();
    for name in expand.unwrap_or("").split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match name {
            "block" => parsed.block = true,
            "width" => parsed.width = true,
            other => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("unknown attribute to expand: {}", other),
                ))
            }
        }
    }
    Ok(parsed)
}

/// All segments carrying a planning id, or 404.
async fn find_street(state: &AppState, id: &str) -> Result<Vec<Street>, ApiError> {
    match state.gateway.street_by_id(id).await.map_err(api_error)? {
        Some(streets) if !streets.is_empty() => Ok(streets),
        _ => Err(not_found("street", id)),
    }
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.gateway.config();
    Json(HealthResponse {
        status: "ok",
        street_layers: config.streets.urls.len(),
        area_plan_layers: config.plans.area_plan_urls.len(),
        master_street_plan_layers: config.plans.master_street_plan_urls.len(),
        project_layers: config.plans.project_urls.len(),
    })
}

/// Streets intersecting a bounding box
pub async fn streets_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BboxParams>,
) -> Result<Json<Listing<Street>>, ApiError> {
    let bbox = parse_bbox(&params.bbox, params.spatial_reference).map_err(api_error)?;
    let streets = state.gateway.streets_by_bbox(bbox).await.map_err(api_error)?;
    Ok(Listing::new(streets.unwrap_or_default()))
}

/// Street segments by planning id, with optional derived attributes
pub async fn street_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ExpandParams>,
) -> Result<Json<Listing<Street>>, ApiError> {
    let expand = parse_expand(params.expand.as_deref())?;
    let streets = find_street(&state, &id).await?;

    let expanded = futures::future::join_all(
        streets
            .into_iter()
            .map(|street| state.gateway.expand(street, expand)),
    )
    .await;

    Ok(Listing::new(expanded))
}

/// Plans, projects or neighbouring streets around a street
pub async fn street_relation_handler(
    State(state): State<Arc<AppState>>,
    Path((id, relation)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let streets = find_street(&state, &id).await?;
    let street = &streets[0];
    let gateway = &state.gateway;

    let response = match relation.as_str() {
        "areaPlans" => Listing::new(gateway.street_area_plans(street).await.map_err(api_error)?).into_response(),
        "masterStreetPlans" => {
            Listing::new(gateway.street_master_street_plans(street).await.map_err(api_error)?).into_response()
        }
        "projects" => Listing::new(gateway.street_projects(street).await.map_err(api_error)?).into_response(),
        "relatedStreets" => {
            let related = gateway.related_streets(street).await.map_err(api_error)?;
            Listing::new(related.unwrap_or_default()).into_response()
        }
        other => return Err(not_found("relation", other)),
    };

    Ok(response)
}

pub async fn area_plans_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BboxParams>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&params.bbox, params.spatial_reference).map_err(api_error)?;
    let plans = state.gateway.area_plans_by_bbox(bbox).await.map_err(api_error)?;
    Ok(Listing::new(plans).into_response())
}

pub async fn area_plan_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let plans = state.gateway.area_plans_by_id(id).await.map_err(api_error)?;
    if plans.is_empty() {
        return Err(not_found("area plan", &id.to_string()));
    }
    Ok(Listing::new(plans).into_response())
}

pub async fn master_street_plans_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BboxParams>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&params.bbox, params.spatial_reference).map_err(api_error)?;
    let plans = state
        .gateway
        .master_street_plans_by_bbox(bbox)
        .await
        .map_err(api_error)?;
    Ok(Listing::new(plans).into_response())
}

pub async fn master_street_plan_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let plans = state.gateway.master_street_plans_by_id(id).await.map_err(api_error)?;
    if plans.is_empty() {
        return Err(not_found("master street plan", &id.to_string()));
    }
    Ok(Listing::new(plans).into_response())
}

pub async fn projects_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BboxParams>,
) -> Result<Response, ApiError> {
    let bbox = parse_bbox(&params.bbox, params.spatial_reference).map_err(api_error)?;
    let projects = state.gateway.projects_by_bbox(bbox).await.map_err(api_error)?;
    Ok(Listing::new(projects).into_response())
}

pub async fn project_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let projects = state.gateway.projects_by_id(&id).await.map_err(api_error)?;
    if projects.is_empty() {
        return Err(not_found("project", &id));
    }
    Ok(Listing::new(projects).into_response())
}
