use shared::Coordinate;

use crate::models::{ActivityType, Point, Track, TrackStatistics};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Fully computed statistics of a point sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStatistics {
    pub distance_meters: f64,
    pub elevation_gain_meters: f64,
    pub duration_seconds: u64,
}

impl RouteStatistics {
    pub const ZERO: RouteStatistics = RouteStatistics {
        distance_meters: 0.0,
        elevation_gain_meters: 0.0,
        duration_seconds: 0,
    };
}

/// Great-circle distance in meters (atan2 form of the Haversine formula).
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = (sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon).min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c * 1000.0
}

pub fn distance_between(a: &Point, b: &Point) -> f64 {
    haversine_m(a.coordinate(), b.coordinate())
}

/// Sum of consecutive Haversine distances.
pub fn path_distance_m(points: &[Point]) -> f64 {
    points.windows(2).map(|w| distance_between(&w[0], &w[1])).sum()
}

/// Sum of positive elevation deltas. Pairs with a missing elevation are skipped.
pub fn elevation_gain_m(points: &[Point]) -> f64 {
    points
        .windows(2)
        .filter_map(|w| match (w[0].elevation, w[1].elevation) {
            (Some(prev), Some(curr)) => Some((curr - prev).max(0.0)),
            _ => None,
        })
        .sum()
}

fn base_speed_kmh(activity: ActivityType) -> f64 {
    match activity {
        ActivityType::Cycling => 25.0,
        ActivityType::MountainBiking => 15.0,
        ActivityType::RoadCycling => 35.0,
        ActivityType::Gravel => 20.0,
        ActivityType::EBike => 30.0,
        ActivityType::Hiking => 4.0,
        ActivityType::Running => 10.0,
        ActivityType::Walking => 3.0,
        ActivityType::Driving => 50.0,
        ActivityType::Motorcycle => 60.0,
        ActivityType::PublicTransport | ActivityType::Other => 25.0,
    }
}

/// Meters of climbing that cost one extra hour, or `None` when climbing is free.
fn climb_meters_per_hour(activity: ActivityType) -> Option<f64> {
    match activity {
        ActivityType::Hiking | ActivityType::Walking => Some(600.0),
        ActivityType::Cycling | ActivityType::MountainBiking | ActivityType::Gravel => {
            Some(1000.0)
        }
        ActivityType::RoadCycling => Some(1500.0),
        ActivityType::EBike => Some(2000.0),
        _ => None,
    }
}

/// Estimated moving time in whole seconds. Climbing is charged as extra
/// equivalent distance covered at the activity's base speed.
pub fn estimate_duration_s(distance_m: f64, elevation_gain_m: f64, activity: ActivityType) -> u64 {
    let base_speed = base_speed_kmh(activity);
    let distance_km = distance_m / 1000.0;
    let penalty_km = climb_meters_per_hour(activity)
        .map(|per_hour| elevation_gain_m / per_hour * base_speed)
        .unwrap_or(0.0);

    let hours = (distance_km + penalty_km) / base_speed;
    (hours * 3600.0).round().max(0.0) as u64
}

pub fn compute_statistics(points: &[Point], activity: ActivityType) -> RouteStatistics {
    if points.len() < 2 {
        return RouteStatistics::ZERO;
    }

    let distance_meters = path_distance_m(points);
    let elevation_gain_meters = elevation_gain_m(points);
    let duration_seconds = estimate_duration_s(distance_meters, elevation_gain_meters, activity);

    tracing::debug!(
        "computed statistics: distance={distance_meters:.1}m gain={elevation_gain_meters:.1}m duration={duration_seconds}s"
    );

    RouteStatistics {
        distance_meters,
        elevation_gain_meters,
        duration_seconds,
    }
}

/// Returns the track's statistics with every unset field computed. Supplied values
/// are kept as-is and feed the duration estimate when it is the missing one.
pub fn merge_missing_statistics(track: &Track) -> TrackStatistics {
    let supplied = track.statistics;
    if supplied.is_complete() {
        return supplied;
    }

    let points = track.points();
    let (distance, gain) = if points.len() < 2 {
        (
            supplied.total_distance_meters.unwrap_or(0.0),
            supplied.total_elevation_gain_meters.unwrap_or(0.0),
        )
    } else {
        (
            supplied
                .total_distance_meters
                .unwrap_or_else(|| path_distance_m(points)),
            supplied
                .total_elevation_gain_meters
                .unwrap_or_else(|| elevation_gain_m(points)),
        )
    };

    let duration = supplied.estimated_duration_seconds.unwrap_or_else(|| {
        if points.len() < 2 && supplied.total_distance_meters.is_none() {
            0
        } else {
            estimate_duration_s(distance, gain, track.activity_type)
        }
    });

    TrackStatistics {
        total_distance_meters: Some(distance),
        total_elevation_gain_meters: Some(gain),
        estimated_duration_seconds: Some(duration),
    }
}

/// Consumes a track and returns it with complete statistics.
pub fn with_missing_statistics(mut track: Track) -> Track {
    track.statistics = merge_missing_statistics(&track);
    track
}
