use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hyper::StatusCode;
use serde_json::{Value, json};
use shared::{AnalysisResponse, ApiError};
use tower::ServiceExt;
use trackoss_engine::{
    AppState, create_router,
    error::LookupError,
    lookup::{NoLookup, RoadTag, RoadTagLookup},
    models::{ActivityType, PointKind, Track},
};

const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><name>Lac d'Annecy</name><desc>Shore loop</desc></metadata>
  <wpt lat="45.8650" lon="6.1720"><name>Beach</name></wpt>
  <trk><name>Track name</name><trkseg>
    <trkpt lat="45.8600" lon="6.1700"><ele>447</ele></trkpt>
    <trkpt lat="45.8700" lon="6.1750"><ele>470</ele></trkpt>
    <trkpt lat="45.8800" lon="6.1800"><ele>455</ele></trkpt>
  </trkseg></trk>
</gpx>"#;

/// Cycleway north of 45.005, residential street south of it.
struct SplitLookup;

#[async_trait]
impl RoadTagLookup for SplitLookup {
    async fn lookup(&self, lat: f64, _lon: f64) -> Result<Option<RoadTag>, LookupError> {
        let highway = if lat > 45.005 { "cycleway" } else { "residential" };
        Ok(Some(RoadTag::highway(highway)))
    }
}

fn app_with(lookup: Arc<dyn RoadTagLookup>) -> axum::Router {
    create_router(AppState {
        lookup,
        lookup_delay: Duration::ZERO,
    })
}

fn test_app() -> axum::Router {
    app_with(Arc::new(NoLookup))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), 1024 * 1024).await.unwrap().to_vec()
}

fn sample_track_json() -> Value {
    json!({
        "name": "Evening ride",
        "activityType": "ROAD_CYCLING",
        "points": [
            {"latitude": 45.0, "longitude": 5.0, "elevation": 200.0},
            {"latitude": 45.01, "longitude": 5.0, "elevation": 260.0, "kind": "WAYPOINT", "name": "Viewpoint"},
            {"latitude": 45.02, "longitude": 5.0, "elevation": 240.0}
        ]
    })
}

#[tokio::test]
async fn health_answers() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn analyze_splits_route_by_road_type() {
    let app = app_with(Arc::new(SplitLookup));
    let payload = json!({
        "points": [
            {"latitude": 45.000, "longitude": 5.0, "sequenceOrder": 0},
            {"latitude": 45.002, "longitude": 5.0, "sequenceOrder": 1},
            {"latitude": 45.004, "longitude": 5.0, "sequenceOrder": 2},
            {"latitude": 45.006, "longitude": 5.0, "sequenceOrder": 3},
            {"latitude": 45.008, "longitude": 5.0, "sequenceOrder": 4}
        ],
        "totalDistance": 890.0
    });

    let response = app.oneshot(post_json("/api/routes/analyze", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: AnalysisResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let types: Vec<&str> = body
        .road_type_segments
        .iter()
        .map(|s| s.road_type.as_str())
        .collect();
    assert_eq!(types, vec!["RESIDENTIAL", "BIKE_PATH"]);
    assert_eq!(body.road_type_segments[0].end_index, 2);
    assert_eq!(body.road_type_segments[1].start_index, 2);
    assert_eq!(body.road_type_stats.total_types, 2);

    let sum: f64 = body
        .road_type_stats
        .breakdown
        .iter()
        .map(|s| s.percentage.parse::<f64>().unwrap())
        .sum();
    assert!((sum - 100.0).abs() < 0.1);

    let metadata: Value = serde_json::from_str(&body.metadata).unwrap();
    assert_eq!(metadata["roadTypeSegments"].as_array().unwrap().len(), 2);
    assert_eq!(metadata["roadTypeStats"]["totalTypes"], json!(2));
}

#[tokio::test]
async fn analyze_single_point_is_empty() {
    let payload = json!({"points": [{"latitude": 45.0, "longitude": 5.0}]});
    let response = test_app()
        .oneshot(post_json("/api/routes/analyze", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: AnalysisResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body.road_type_segments.is_empty());
    assert_eq!(body.metadata, "{}");
}

#[tokio::test]
async fn statistics_fills_missing_fields() {
    let response = test_app()
        .oneshot(post_json("/api/routes/statistics", &sample_track_json()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let track: Track = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(track.statistics.is_complete());
    assert_eq!(track.statistics.total_elevation_gain_meters, Some(60.0));
    let distance = track.statistics.total_distance_meters.unwrap();
    assert!((distance - 2224.0).abs() < 5.0, "distance was {distance}");
}

#[tokio::test]
async fn statistics_accepts_unknown_activity() {
    let mut payload = sample_track_json();
    payload["activityType"] = json!("paragliding");

    let response = test_app()
        .oneshot(post_json("/api/routes/statistics", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let track: Track = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(track.activity_type, ActivityType::Cycling);
}

#[tokio::test]
async fn gpx_import_resolves_name_and_computes_statistics() {
    let payload = json!({"gpxBase64": BASE64.encode(SAMPLE_GPX)});
    let response = test_app()
        .oneshot(post_json("/api/routes/import/gpx", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let track: Track = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(track.name, "Lac d'Annecy");
    assert_eq!(track.description.as_deref(), Some("Shore loop"));
    assert_eq!(track.activity_type, ActivityType::Hiking);
    assert_eq!(track.len(), 4);
    assert_eq!(track.points()[3].kind, PointKind::Waypoint);
    assert!(track.statistics.is_complete());
}

#[tokio::test]
async fn gpx_import_rejects_bad_input() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json("/api/routes/import/gpx", &json!({"gpxBase64": "***"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let empty = r#"<?xml version="1.0"?><gpx version="1.1" creator="test"></gpx>"#;
    let response = app
        .oneshot(post_json(
            "/api/routes/import/gpx",
            &json!({"gpxBase64": BASE64.encode(empty)}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.message.contains("no valid track points"));
}

#[tokio::test]
async fn geojson_import_takes_name_from_query() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/routes/import/geojson?name=Pike%20Place")
        .header("content-type", "application/geo+json")
        .body(Body::from(r#"{"type":"Point","coordinates":[-122.3321,47.6062]}"#))
        .unwrap();

    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let track: Track = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(track.name, "Pike Place");
    assert_eq!(track.activity_type, ActivityType::Other);
    assert_eq!(track.points()[0].longitude, -122.3321);
    assert_eq!(track.statistics.total_distance_meters, Some(0.0));
}

#[tokio::test]
async fn exports_carry_format_content_types() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json("/api/routes/export/gpx", &sample_track_json()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/gpx+xml"
    );
    let xml = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(xml.contains("Viewpoint"));

    let response = app
        .oneshot(post_json("/api/routes/export/geojson", &sample_track_json()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/geo+json"
    );
    let collection: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(collection["type"], json!("FeatureCollection"));
    assert_eq!(collection["features"].as_array().unwrap().len(), 2);
    assert_eq!(
        collection["features"][0]["properties"]["activityType"],
        json!("ROAD_CYCLING")
    );
}
