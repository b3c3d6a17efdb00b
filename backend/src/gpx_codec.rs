use chrono::{DateTime, Utc};
use geo_types::Point as GeoPoint;
use gpx::{Gpx, GpxVersion, Metadata, Track as GpxTrack, TrackSegment, Waypoint};
use time::OffsetDateTime;

use crate::error::TrackError;
use crate::models::{ActivityType, Point, PointKind, Track};

const CREATOR: &str = "trackoss-engine";
const FALLBACK_NAME: &str = "Imported Route";

/// Render a track as a GPX 1.1 document. All points go into a single track
/// segment; named waypoints are repeated as top-level `<wpt>` elements.
pub fn export_gpx(track: &Track) -> Result<Vec<u8>, TrackError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };

    if !track.name.is_empty() || track.description.is_some() {
        gpx.metadata = Some(Metadata {
            name: non_empty(&track.name),
            description: track.description.clone(),
            ..Default::default()
        });
    }

    let mut segment = TrackSegment::new();
    segment.points.extend(track.points().iter().map(to_waypoint));

    gpx.tracks.push(GpxTrack {
        name: non_empty(&track.name),
        description: track.description.clone(),
        segments: vec![segment],
        ..Default::default()
    });

    gpx.waypoints.extend(
        track
            .points()
            .iter()
            .filter(|point| point.is_named_waypoint())
            .map(to_waypoint),
    );

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer).map_err(TrackError::GpxWrite)?;
    tracing::debug!(
        "exported '{}' as GPX ({} points, {} waypoints, {} bytes)",
        track.name,
        track.len(),
        gpx.waypoints.len(),
        buffer.len()
    );
    Ok(buffer)
}

/// Parse a GPX document into a flat track: track points first, then waypoints,
/// then route points. `name` overrides whatever the document carries.
pub fn import_gpx(bytes: &[u8], name: Option<&str>) -> Result<Track, TrackError> {
    let gpx = gpx::read(bytes).map_err(TrackError::MalformedGpx)?;

    let metadata_name = gpx.metadata.as_ref().and_then(|m| m.name.clone());
    let first_track_name = gpx.tracks.first().and_then(|t| t.name.clone());
    let resolved_name = name
        .map(str::to_string)
        .filter(|n| !n.trim().is_empty())
        .or(metadata_name)
        .or(first_track_name)
        .unwrap_or_else(|| FALLBACK_NAME.to_string());

    let mut track = Track::new(resolved_name, ActivityType::Hiking);
    track.description = gpx.metadata.as_ref().and_then(|m| m.description.clone());

    let track_points = gpx
        .tracks
        .iter()
        .flat_map(|t| &t.segments)
        .flat_map(|s| &s.points)
        .map(|w| from_waypoint(w, PointKind::TrackPoint));
    let waypoints = gpx
        .waypoints
        .iter()
        .map(|w| from_waypoint(w, PointKind::Waypoint));
    let route_points = gpx
        .routes
        .iter()
        .flat_map(|r| &r.points)
        .map(|w| from_waypoint(w, PointKind::RoutePoint));

    track.extend(track_points.chain(waypoints).chain(route_points));

    if track.is_empty() {
        return Err(TrackError::NoValidPoints { format: "GPX" });
    }

    let point_count = track.len();
    tracing::info!("imported GPX route '{}' with {point_count} points", track.name);
    Ok(track)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn to_waypoint(point: &Point) -> Waypoint {
    let mut waypoint = Waypoint::new(GeoPoint::new(point.longitude, point.latitude));
    waypoint.elevation = point.elevation;
    waypoint.time = point.timestamp.and_then(to_gpx_time);
    waypoint.name = point.name.clone();
    waypoint.description = point.description.clone();
    waypoint
}

fn from_waypoint(waypoint: &Waypoint, kind: PointKind) -> Point {
    let position = waypoint.point();
    let mut point = Point::new(position.y(), position.x(), kind)
        .with_elevation(waypoint.elevation)
        .with_name(waypoint.name.clone());
    point.description = waypoint.description.clone();
    point.timestamp = waypoint.time.and_then(from_gpx_time);
    point
}

fn to_gpx_time(timestamp: DateTime<Utc>) -> Option<gpx::Time> {
    let nanos = timestamp.timestamp_nanos_opt()?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .ok()
        .map(gpx::Time::from)
}

fn from_gpx_time(time: gpx::Time) -> Option<DateTime<Utc>> {
    let nanos = OffsetDateTime::from(time).unix_timestamp_nanos();
    let secs = i64::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let subsec = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
    DateTime::from_timestamp(secs, subsec)
}
