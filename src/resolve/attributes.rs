//! Best-effort derived attributes of a street: block number and width.
//!
//! Each lookup queries a dedicated service near the street, picks the nearest
//! same-named candidate and reads one field from it. Nothing here fails the
//! street: every fault ends up as an [`Unknown`].

use tracing::debug;

use super::ranker::{disambiguate, FeatureCandidate, Target};
use crate::arcgis::{FeatureClient, FeatureSource, OutputFormat, QueryParams, SpatialRel};
use crate::error::{AttributeResult, Unknown};
use crate::models::{Geometry, Street};
use crate::spatial::buffer_meters;

pub const BLOCK_NAME_FIELD: &str = "FULL_NAME";
pub const BLOCK_OUT_FIELDS: &str = "FULL_NAME, LEFTADD1, LEFTADD2, RGTADD1, RGTADD2";
const ADDRESS_RANGE_FIELDS: [&str; 4] = ["LEFTADD1", "LEFTADD2", "RGTADD1", "RGTADD2"];

pub const WIDTH_NAME_FIELD: &str = "Streetname";
pub const WIDTH_OUT_FIELDS: &str = "Streetname, RoadWidth";
const WIDTH_FIELD: &str = "RoadWidth";

/// Search radius around a street when looking up its width.
pub const WIDTH_SEARCH_BUFFER_M: f64 = 10.0;

/// Query `service_url` with `geometry` and pick the candidate nearest the street.
async fn nearest_candidate<S: FeatureSource>(
    client: &FeatureClient<S>,
    service_url: &str,
    street: &Street,
    geometry: &Geometry,
    name_field: &str,
    out_fields: &str,
) -> AttributeResult<FeatureCandidate> {
    // Unnamed streets cannot be matched by name
    let name = street.name.as_deref().ok_or(Unknown::NoMatch)?;

    let params = QueryParams::geometry(geometry, SpatialRel::EnvelopeIntersects, OutputFormat::GeoJson)
        .with_out_fields(out_fields);

    let features = client
        .query_one(service_url, &params)
        .await
        .map_err(|e| Unknown::Unavailable(e.to_string()))?
        .ok_or(Unknown::NoCandidates)?;

    let target = Target {
        name,
        midpoint: street.midpoint,
    };

    let candidates: Vec<FeatureCandidate> = features
        .into_iter()
        .filter_map(|f| FeatureCandidate::from_feature(f, name_field))
        .collect();

    disambiguate(&target, &candidates)
        .cloned()
        .ok_or(Unknown::NoMatch)
}

fn log_unknown<T>(attribute: &str, street: &Street, result: AttributeResult<T>) -> AttributeResult<T> {
    if let Err(reason) = &result {
        debug!(
            "{} unknown for street {}: {}",
            attribute,
            street.id.as_deref().unwrap_or("<no id>"),
            reason
        );
    }
    result
}

/// Block number: the lowest address on the nearest matching centerline.
pub async fn resolve_block<S: FeatureSource>(
    client: &FeatureClient<S>,
    service_url: &str,
    street: &Street,
) -> AttributeResult<i64> {
    let result: AttributeResult<i64> = async {
        let winner = nearest_candidate(
            client,
            service_url,
            street,
            &street.geometry,
            BLOCK_NAME_FIELD,
            BLOCK_OUT_FIELDS,
        )
        .await?;

        ADDRESS_RANGE_FIELDS
            .iter()
            .filter_map(|field| winner.feature.attr_i64(field))
            .min()
            .ok_or(Unknown::MissingField)
    }
    .await;

    log_unknown("block", street, result)
}

/// Street width in feet from the nearest matching asset within the search buffer.
pub async fn resolve_width<S: FeatureSource>(
    client: &FeatureClient<S>,
    service_url: &str,
    street: &Street,
) -> AttributeResult<f64> {
    let result: AttributeResult<f64> = async {
        let area = buffer_meters(&street.geometry, WIDTH_SEARCH_BUFFER_M)
            .map_err(|e| Unknown::Geometry(e.to_string()))?;

        let winner = nearest_candidate(
            client,
            service_url,
            street,
            &Geometry::Polygon(area),
            WIDTH_NAME_FIELD,
            WIDTH_OUT_FIELDS,
        )
        .await?;

        winner.feature.attr_f64(WIDTH_FIELD).ok_or(Unknown::MissingField)
    }
    .await;

    log_unknown("width", street, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcgis::mock::{feature, MockSource};
    use crate::resolve::parse_street;
    use geo::{line_string, LineString};
    use serde_json::{json, Value};

    const BLOCKS: &str = "https://gis.test/blocks";
    const WIDTHS: &str = "https://gis.test/widths";

    const MID_LON: f64 = -122.665;
    const MID_LAT: f64 = 45.515;

    /// SW Main St running east-west, midpoint at (MID_LON, MID_LAT).
    fn main_st() -> Street {
        parse_street(feature(
            json!({ "TranPlanID": "11234", "StreetName": "SW Main St" }),
            Some(Geometry::LineString(line_string![
                (x: MID_LON - 0.001, y: MID_LAT),
                (x: MID_LON + 0.001, y: MID_LAT),
            ])),
        ))
        .unwrap()
    }

    /// A centerline whose midpoint is `meters` north of the street's midpoint.
    fn centerline(meters: f64) -> Geometry {
        let lat = MID_LAT + meters / 111_195.0;
        Geometry::LineString(line_string![
            (x: MID_LON - 0.0005, y: lat),
            (x: MID_LON + 0.0005, y: lat),
        ])
    }

    fn block_feature(name: &str, meters: f64, adds: [i64; 4]) -> crate::arcgis::Feature {
        feature(
            json!({
                "FULL_NAME": name,
                "LEFTADD1": adds[0],
                "LEFTADD2": adds[1],
                "RGTADD1": adds[2],
                "RGTADD2": adds[3],
            }),
            Some(centerline(meters)),
        )
    }

    fn width_feature(name: &str, meters: f64, width: Value) -> crate::arcgis::Feature {
        feature(json!({ "Streetname": name, "RoadWidth": width }), Some(centerline(meters)))
    }

    #[tokio::test]
    async fn test_block_picks_nearest_name_match() {
        let source = MockSource::new().features(
            BLOCKS,
            vec![
                block_feature("SW Main Street", 40.0, [100, 101, 102, 103]),
                block_feature("SW Main St", 3.0, [1200, 1299, 1201, 1298]),
            ],
        );
        let client = FeatureClient::new(source);

        let block = resolve_block(&client, BLOCKS, &main_st()).await;
        assert_eq!(block, Ok(1200));

        let (url, params) = &client.source().requests()[0];
        assert_eq!(url, BLOCKS);
        assert_eq!(params.geometry_type, Some("esriGeometryPolyline"));
        assert_eq!(params.spatial_rel, Some(SpatialRel::EnvelopeIntersects));
        assert_eq!(params.out_fields, BLOCK_OUT_FIELDS);
    }

    #[tokio::test]
    async fn test_block_uses_present_address_fields() {
        let partial = feature(
            json!({ "FULL_NAME": "SW Main St", "LEFTADD1": 1250, "RGTADD2": 1210 }),
            Some(centerline(2.0)),
        );
        let client = FeatureClient::new(MockSource::new().features(BLOCKS, vec![partial]));
        assert_eq!(resolve_block(&client, BLOCKS, &main_st()).await, Ok(1210));

        let bare = feature(json!({ "FULL_NAME": "SW Main St" }), Some(centerline(2.0)));
        let client = FeatureClient::new(MockSource::new().features(BLOCKS, vec![bare]));
        assert_eq!(
            resolve_block(&client, BLOCKS, &main_st()).await,
            Err(Unknown::MissingField)
        );
    }

    #[tokio::test]
    async fn test_width_queries_with_buffer_polygon() {
        let source = MockSource::new().features(
            WIDTHS,
            vec![
                width_feature("SW Main St", 25.0, json!(60.0)),
                width_feature("SW Main", 4.0, json!(36.0)),
                width_feature("NE Broadway", 1.0, json!(80.0)),
            ],
        );
        let client = FeatureClient::new(source);

        assert_eq!(resolve_width(&client, WIDTHS, &main_st()).await, Ok(36.0));

        let (_, params) = &client.source().requests()[0];
        assert_eq!(params.geometry_type, Some("esriGeometryPolygon"));
        assert_eq!(params.out_fields, WIDTH_OUT_FIELDS);
        assert!(params.geometry.as_deref().unwrap_or("").contains("rings"));
    }

    #[tokio::test]
    async fn test_width_fault_degrades_to_unknown() {
        let client = FeatureClient::new(MockSource::new().failing(WIDTHS));
        let width = resolve_width(&client, WIDTHS, &main_st()).await;
        assert!(matches!(width, Err(Unknown::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_and_unmatched_responses() {
        let client = FeatureClient::new(MockSource::new().empty(BLOCKS));
        assert_eq!(
            resolve_block(&client, BLOCKS, &main_st()).await,
            Err(Unknown::NoCandidates)
        );

        let client = FeatureClient::new(
            MockSource::new().features(BLOCKS, vec![block_feature("SE Main St", 1.0, [1, 2, 3, 4])]),
        );
        assert_eq!(
            resolve_block(&client, BLOCKS, &main_st()).await,
            Err(Unknown::NoMatch)
        );
    }

    #[tokio::test]
    async fn test_unnamed_street_never_matches() {
        let mut street = main_st();
        street.name = None;
        let client = FeatureClient::new(
            MockSource::new().features(BLOCKS, vec![block_feature("", 1.0, [1, 2, 3, 4])]),
        );
        assert_eq!(resolve_block(&client, BLOCKS, &street).await, Err(Unknown::NoMatch));
        assert_eq!(resolve_width(&client, WIDTHS, &street).await, Err(Unknown::NoMatch));
        assert!(client.source().calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_street_geometry_has_no_width() {
        let mut street = main_st();
        street.geometry = Geometry::LineString(LineString::new(vec![]));
        let client = FeatureClient::new(MockSource::new());
        assert!(matches!(
            resolve_width(&client, WIDTHS, &street).await,
            Err(Unknown::Geometry(_))
        ));
        assert!(client.source().calls().is_empty());
    }
}
