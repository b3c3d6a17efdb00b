use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use shared::{
    AnalysisRequest, AnalysisResponse, ApiError, CoordinatePoint, GpxImportRequest,
    RoadTypeSegmentResponse, RoadTypeStatResponse, RoadTypeStatsResponse,
};

use crate::error::TrackError;
use crate::geojson_codec::{export_geojson_string, import_geojson};
use crate::geometry::with_missing_statistics;
use crate::gpx_codec::{export_gpx, import_gpx};
use crate::lookup::classify_points;
use crate::models::{Point, PointKind, Track};
use crate::segmentation::{analyze, RouteAnalysis};
use crate::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// POST /api/routes/analyze - Classify every point and break the route down by road type
pub async fn analyze_route(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Json<AnalysisResponse> {
    let points = analysis_points(req.points);
    if points.len() < 2 {
        tracing::debug!("analysis request with {} points, nothing to segment", points.len());
        return Json(AnalysisResponse::empty());
    }

    let road_types = classify_points(&points, state.lookup.as_ref(), state.lookup_delay).await;
    let analysis = analyze(&points, &road_types, req.total_distance);
    Json(to_response(&analysis))
}

/// POST /api/routes/statistics - Fill in whatever statistics the track lacks
pub async fn route_statistics(Json(track): Json<Track>) -> Json<Track> {
    Json(with_missing_statistics(track))
}

/// POST /api/routes/import/gpx
pub async fn import_gpx_route(Json(req): Json<GpxImportRequest>) -> ApiResult<Json<Track>> {
    let bytes = BASE64.decode(req.gpx_base64.trim()).map_err(|err| {
        bad_request(format!("gpxBase64 is not valid base64: {err}"))
    })?;

    let track = import_gpx(&bytes, req.name.as_deref()).map_err(track_error)?;
    Ok(Json(with_missing_statistics(track)))
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub name: Option<String>,
}

/// POST /api/routes/import/geojson?name=
pub async fn import_geojson_route(
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> ApiResult<Json<Track>> {
    let text = std::str::from_utf8(&body)
        .map_err(|_| bad_request("GeoJSON body must be UTF-8".to_string()))?;

    let track = import_geojson(text, query.name.as_deref()).map_err(track_error)?;
    Ok(Json(with_missing_statistics(track)))
}

/// POST /api/routes/export/gpx
pub async fn export_gpx_route(Json(track): Json<Track>) -> ApiResult<impl IntoResponse> {
    let body = export_gpx(&track).map_err(track_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/gpx+xml".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&track.name, "gpx")),
        ],
        body,
    ))
}

/// POST /api/routes/export/geojson
pub async fn export_geojson_route(Json(track): Json<Track>) -> ApiResult<impl IntoResponse> {
    let body = export_geojson_string(&track).map_err(track_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/geo+json".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&track.name, "geojson")),
        ],
        body,
    ))
}

/// Requests are reordered by `sequenceOrder` only when every point carries one.
fn analysis_points(mut input: Vec<CoordinatePoint>) -> Vec<Point> {
    if !input.is_empty() && input.iter().all(|p| p.sequence_order.is_some()) {
        input.sort_by_key(|p| p.sequence_order);
    }
    input
        .into_iter()
        .map(|p| Point::new(p.latitude, p.longitude, PointKind::TrackPoint))
        .collect()
}

fn to_response(analysis: &RouteAnalysis) -> AnalysisResponse {
    let metadata = serde_json::to_string(&analysis.summary()).unwrap_or_else(|err| {
        tracing::warn!("failed to serialize analysis summary: {err}");
        "{}".to_string()
    });

    AnalysisResponse {
        road_type_segments: analysis
            .segments
            .iter()
            .map(|s| RoadTypeSegmentResponse {
                road_type: s.road_type.as_str().to_string(),
                start_index: s.start_index,
                end_index: s.end_index,
                distance: s.distance_meters,
                color: s.color.to_string(),
                coordinates: s.coordinates.clone(),
            })
            .collect(),
        road_type_stats: RoadTypeStatsResponse {
            breakdown: analysis
                .stats
                .breakdown
                .iter()
                .map(|s| RoadTypeStatResponse {
                    road_type: s.road_type.as_str().to_string(),
                    distance: s.distance_meters,
                    percentage: s.percentage.clone(),
                    segment_count: s.segment_count,
                    color: s.color.to_string(),
                })
                .collect(),
            total_distance: analysis.stats.total_distance_meters,
            total_types: analysis.stats.total_types,
        },
        metadata,
    }
}

fn attachment(name: &str, extension: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "route".to_string() } else { stem };
    format!("attachment; filename=\"{stem}.{extension}\"")
}

fn bad_request(message: String) -> (StatusCode, Json<ApiError>) {
    tracing::warn!("rejected request: {message}");
    (StatusCode::BAD_REQUEST, Json(ApiError { message }))
}

fn track_error(err: TrackError) -> (StatusCode, Json<ApiError>) {
    let status = if err.is_rejected_input() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    tracing::warn!("track conversion failed ({status}): {err}");
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
