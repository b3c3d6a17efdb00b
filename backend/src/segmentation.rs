use serde::Serialize;
use serde_json::json;

use crate::geometry::path_distance_m;
use crate::models::Point;
use crate::road_type::{color_of, RoadType};

/// A maximal run of consecutive points sharing one road type. Adjacent
/// segments share their boundary point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeSegment {
    pub road_type: RoadType,
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
    #[serde(rename = "distance")]
    pub distance_meters: f64,
    pub color: &'static str,
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeStat {
    pub road_type: RoadType,
    #[serde(rename = "distance")]
    pub distance_meters: f64,
    /// Share of the summed segment distance, one decimal place.
    pub percentage: String,
    #[serde(skip)]
    pub percentage_value: f64,
    pub segment_count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeBreakdown {
    /// Sorted by percentage, largest first.
    pub breakdown: Vec<RoadTypeStat>,
    #[serde(skip)]
    pub total_distance_meters: f64,
    pub total_types: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteAnalysis {
    pub segments: Vec<RoadTypeSegment>,
    pub stats: RoadTypeBreakdown,
}

impl RouteAnalysis {
    /// Combined summary blob: `{"roadTypeSegments": [...], "roadTypeStats": {...}}`.
    pub fn summary(&self) -> serde_json::Value {
        match (
            serde_json::to_value(&self.segments),
            serde_json::to_value(&self.stats),
        ) {
            (Ok(segments), Ok(stats)) => json!({
                "roadTypeSegments": segments,
                "roadTypeStats": stats,
            }),
            _ => json!({}),
        }
    }
}

fn close_segment(road_type: RoadType, start_index: usize, buffer: &[Point]) -> RoadTypeSegment {
    RoadTypeSegment {
        road_type,
        start_index,
        end_index: start_index + buffer.len() - 1,
        distance_meters: path_distance_m(buffer),
        color: color_of(road_type),
        coordinates: buffer.iter().map(Point::position).collect(),
    }
}

/// Group consecutive points by road type. `road_types[i]` is the classification
/// of `points[i]`; the two slices must have the same length.
pub fn segment_by_road_type(points: &[Point], road_types: &[RoadType]) -> Vec<RoadTypeSegment> {
    let mut segments = Vec::new();
    if points.len() < 2 || road_types.len() != points.len() {
        if road_types.len() != points.len() {
            tracing::warn!(
                "road type count {} does not match point count {}",
                road_types.len(),
                points.len()
            );
        }
        return segments;
    }

    let mut current_type = road_types[0];
    let mut start_index = 0;
    let mut buffer: Vec<Point> = vec![points[0].clone()];

    for i in 1..points.len() {
        let point_type = road_types[i];
        if point_type != current_type {
            if buffer.len() > 1 {
                segments.push(close_segment(current_type, start_index, &buffer));
            }
            current_type = point_type;
            start_index = i - 1;
            buffer.clear();
            buffer.push(points[i - 1].clone());
        }
        buffer.push(points[i].clone());
    }

    if buffer.len() > 1 {
        segments.push(close_segment(current_type, start_index, &buffer));
    }

    segments
}

/// Round shares (summing to 1) to tenths of a percent that add up to exactly
/// 1000. Leftover tenths go to the largest remainders, earlier entries first on ties.
fn largest_remainder_tenths(shares: &[f64]) -> Vec<u32> {
    let scaled: Vec<f64> = shares.iter().map(|share| (share * 1000.0).max(0.0)).collect();
    let mut tenths: Vec<u32> = scaled.iter().map(|v| v.floor() as u32).collect();

    let assigned: u32 = tenths.iter().sum();
    let leftover = 1000u32.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| {
        let rem_a = scaled[a] - scaled[a].floor();
        let rem_b = scaled[b] - scaled[b].floor();
        rem_b.partial_cmp(&rem_a).unwrap_or(std::cmp::Ordering::Equal)
    });
    for &i in order.iter().take(leftover) {
        tenths[i] += 1;
    }

    tenths
}

/// Per-type aggregate. Percentages are taken against the summed segment distance and
/// the presented one-decimal strings add up to exactly 100.0, regardless of any
/// externally known route length.
pub fn summarize(segments: &[RoadTypeSegment]) -> RoadTypeBreakdown {
    if segments.is_empty() {
        return RoadTypeBreakdown::default();
    }

    // (type, distance, segment count, point pairs), in order of first appearance
    let mut groups: Vec<(RoadType, f64, usize, usize)> = Vec::new();
    for segment in segments {
        let pairs = segment.end_index - segment.start_index;
        match groups.iter_mut().find(|g| g.0 == segment.road_type) {
            Some(group) => {
                group.1 += segment.distance_meters;
                group.2 += 1;
                group.3 += pairs;
            }
            None => groups.push((segment.road_type, segment.distance_meters, 1, pairs)),
        }
    }

    let total_distance: f64 = groups.iter().map(|g| g.1).sum();
    let total_pairs: usize = groups.iter().map(|g| g.3).sum();

    // Coincident points carry no distance; weight by span instead.
    let shares: Vec<f64> = groups
        .iter()
        .map(|g| {
            if total_distance > 0.0 {
                g.1 / total_distance
            } else {
                g.3 as f64 / total_pairs.max(1) as f64
            }
        })
        .collect();
    let tenths = largest_remainder_tenths(&shares);

    let mut breakdown: Vec<RoadTypeStat> = groups
        .into_iter()
        .zip(shares)
        .zip(tenths)
        .map(|(((road_type, distance, segment_count, _), share), tenths)| RoadTypeStat {
            road_type,
            distance_meters: distance,
            percentage: format!("{}.{}", tenths / 10, tenths % 10),
            percentage_value: share * 100.0,
            segment_count,
            color: color_of(road_type),
        })
        .collect();

    // Stable: equal percentages keep first-appearance order.
    breakdown.sort_by(|a, b| {
        b.percentage_value
            .partial_cmp(&a.percentage_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    RoadTypeBreakdown {
        total_types: breakdown.len(),
        breakdown,
        total_distance_meters: total_distance,
    }
}

/// Segment a classified route and aggregate its breakdown.
///
/// `total_distance_hint` is the caller's idea of the route length. It never feeds
/// the percentages; a large disagreement is only logged.
pub fn analyze(
    points: &[Point],
    road_types: &[RoadType],
    total_distance_hint: Option<f64>,
) -> RouteAnalysis {
    let segments = segment_by_road_type(points, road_types);
    let stats = summarize(&segments);

    if let Some(hint) = total_distance_hint {
        let measured = stats.total_distance_meters;
        if hint > 0.0 && ((measured - hint) / hint).abs() > 0.01 {
            tracing::debug!(
                "supplied total distance {hint:.1}m differs from segment sum {measured:.1}m"
            );
        }
    }

    tracing::info!(
        "route analysis complete: {} segments, {} road types",
        segments.len(),
        stats.total_types
    );

    RouteAnalysis { segments, stats }
}
