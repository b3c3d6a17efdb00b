use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::{json, Value as JsonValue};

use crate::error::TrackError;
use crate::geometry::merge_missing_statistics;
use crate::models::{ActivityType, Point, PointKind, Track, TrackStatistics};

const FALLBACK_NAME: &str = "Imported GeoJSON Route";

/// Render a track as a FeatureCollection: one `LineString` for the whole path,
/// followed by one `Point` feature per named waypoint.
pub fn export_geojson(track: &Track) -> FeatureCollection {
    let mut features = Vec::new();

    if !track.is_empty() {
        let statistics = merge_missing_statistics(track);
        let mut props = JsonObject::new();
        props.insert("name".to_string(), json!(track.name));
        props.insert("description".to_string(), json!(track.description));
        props.insert("activityType".to_string(), json!(track.activity_type.as_str()));
        props.insert("totalDistance".to_string(), json!(statistics.total_distance_meters));
        props.insert(
            "totalElevationGain".to_string(),
            json!(statistics.total_elevation_gain_meters),
        );
        props.insert(
            "estimatedDuration".to_string(),
            json!(statistics.estimated_duration_seconds),
        );

        let coords: Vec<Vec<f64>> = track.points().iter().map(Point::position).collect();
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(coords))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    for point in track.points().iter().filter(|p| p.is_named_waypoint()) {
        let mut props = JsonObject::new();
        props.insert("name".to_string(), json!(point.name));
        props.insert("description".to_string(), json!(point.description));
        props.insert("pointType".to_string(), json!("waypoint"));

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(point.position()))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn export_geojson_string(track: &Track) -> Result<String, TrackError> {
    let collection = export_geojson(track);
    let body = serde_json::to_string(&collection)?;
    tracing::debug!(
        "exported '{}' as GeoJSON ({} features, {} bytes)",
        track.name,
        collection.features.len(),
        body.len()
    );
    Ok(body)
}

/// Route-level attributes gathered while walking features. Each field keeps
/// the first value seen.
#[derive(Default)]
struct RouteProperties {
    name: Option<String>,
    description: Option<String>,
    activity_type: Option<ActivityType>,
    statistics: TrackStatistics,
}

impl RouteProperties {
    fn absorb(&mut self, props: &JsonObject) {
        if self.name.is_none() {
            self.name = text(props, "name");
        }
        if self.description.is_none() {
            self.description = text(props, "description");
        }
        if self.activity_type.is_none() {
            self.activity_type = text(props, "activityType")
                .or_else(|| text(props, "routeType"))
                .and_then(|name| ActivityType::parse(&name));
        }

        let stats = &mut self.statistics;
        if stats.total_distance_meters.is_none() {
            stats.total_distance_meters = props.get("totalDistance").and_then(JsonValue::as_f64);
        }
        if stats.total_elevation_gain_meters.is_none() {
            stats.total_elevation_gain_meters =
                props.get("totalElevationGain").and_then(JsonValue::as_f64);
        }
        if stats.estimated_duration_seconds.is_none() {
            stats.estimated_duration_seconds = props.get("estimatedDuration").and_then(|v| {
                v.as_u64().or_else(|| v.as_f64().filter(|s| *s >= 0.0).map(|s| s as u64))
            });
        }
    }
}

fn text(props: &JsonObject, key: &str) -> Option<String> {
    props.get(key)?.as_str().map(str::to_string)
}

/// Parse a GeoJSON document (FeatureCollection, Feature, or bare geometry) into a
/// track. Geometries other than LineString, MultiLineString and Point, including
/// types unknown to GeoJSON itself, are skipped.
pub fn import_geojson(body: &str, name: Option<&str>) -> Result<Track, TrackError> {
    let document: JsonValue = serde_json::from_str(body).map_err(geojson::Error::MalformedJson)?;

    let mut points = Vec::new();
    let mut route = RouteProperties::default();

    match document.get("type").and_then(JsonValue::as_str) {
        Some("FeatureCollection") => {
            let features = document.get("features").and_then(JsonValue::as_array);
            for feature in features.into_iter().flatten() {
                collect_feature(feature, &mut points, &mut route)?;
            }
        }
        Some("Feature") => collect_feature(&document, &mut points, &mut route)?,
        _ => {
            if let Some(geometry) = parse_geometry(document)? {
                collect_geometry(&geometry, None, &mut points);
            }
        }
    }

    let resolved_name = name
        .map(str::to_string)
        .filter(|n| !n.trim().is_empty())
        .or(route.name)
        .unwrap_or_else(|| FALLBACK_NAME.to_string());

    let mut track = Track::new(
        resolved_name,
        route.activity_type.unwrap_or(ActivityType::Other),
    );
    track.description = route.description;
    track.statistics = route.statistics;
    track.extend(points);

    if track.is_empty() {
        return Err(TrackError::NoValidPoints { format: "GeoJSON" });
    }

    let point_count = track.len();
    tracing::info!("imported GeoJSON route '{}' with {point_count} points", track.name);
    Ok(track)
}

/// `None` for geometry types this importer does not understand.
fn parse_geometry(value: JsonValue) -> Result<Option<Geometry>, TrackError> {
    match Geometry::from_json_value(value) {
        Ok(geometry) => Ok(Some(geometry)),
        Err(geojson::Error::GeometryUnknownType(kind)) => {
            tracing::debug!("skipping unknown geometry type {kind}");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn collect_feature(
    feature: &JsonValue,
    points: &mut Vec<Point>,
    route: &mut RouteProperties,
) -> Result<(), TrackError> {
    let props = feature.get("properties").and_then(JsonValue::as_object);
    if let Some(props) = props {
        route.absorb(props);
    }

    let Some(geometry) = feature.get("geometry").filter(|g| !g.is_null()) else {
        return Ok(());
    };
    if let Some(geometry) = parse_geometry(geometry.clone())? {
        collect_geometry(&geometry, props, points);
    }
    Ok(())
}

fn collect_geometry(geometry: &Geometry, props: Option<&JsonObject>, points: &mut Vec<Point>) {
    match &geometry.value {
        Value::LineString(line) => points.extend(line_points(line)),
        Value::MultiLineString(lines) => {
            for line in lines {
                points.extend(line_points(line));
            }
        }
        Value::Point(position) => {
            let Some(mut point) = from_position(position, PointKind::TrackPoint) else {
                return;
            };
            if let Some(props) = props {
                if let Some(name) = text(props, "name") {
                    point.kind = PointKind::Waypoint;
                    point.name = Some(name);
                }
                point.description = text(props, "description");
            }
            points.push(point);
        }
        _ => tracing::debug!("skipping unsupported geometry"),
    }
}

fn line_points(line: &[Vec<f64>]) -> impl Iterator<Item = Point> + '_ {
    line.iter()
        .filter_map(|position| from_position(position, PointKind::TrackPoint))
}

fn from_position(position: &[f64], kind: PointKind) -> Option<Point> {
    match position {
        [lon, lat] => Some(Point::new(*lat, *lon, kind)),
        [lon, lat, ele, ..] => Some(Point::new(*lat, *lon, kind).with_elevation(Some(*ele))),
        _ => None,
    }
}
