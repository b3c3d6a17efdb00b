use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One point of a route submitted for road-type analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatePoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub points: Vec<CoordinatePoint>,
    /// Optional total route distance in meters, as known by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeSegmentResponse {
    pub road_type: String,
    pub start_index: usize,
    pub end_index: usize,
    pub distance: f64,
    pub color: String,
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeStatResponse {
    pub road_type: String,
    pub distance: f64,
    pub percentage: String,
    pub segment_count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeStatsResponse {
    pub breakdown: Vec<RoadTypeStatResponse>,
    pub total_distance: f64,
    pub total_types: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub road_type_segments: Vec<RoadTypeSegmentResponse>,
    pub road_type_stats: RoadTypeStatsResponse,
    /// Combined machine-readable summary, serialized as a JSON string.
    pub metadata: String,
}

impl AnalysisResponse {
    pub fn empty() -> Self {
        Self {
            road_type_segments: Vec::new(),
            road_type_stats: RoadTypeStatsResponse::default(),
            metadata: "{}".to_string(),
        }
    }
}

/// Body of a GPX import request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxImportRequest {
    pub gpx_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
