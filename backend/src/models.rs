use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Coordinate;

/// Role of a point inside a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointKind {
    /// Named point of interest.
    Waypoint,
    #[default]
    TrackPoint,
    RoutePoint,
    StartPoint,
    EndPoint,
}

/// Mode of travel. Selects the speed and climbing parameters of the duration estimate.
///
/// Deserialization is case-insensitive and never fails on a string: unknown names
/// become the default, [`ActivityType::Cycling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    #[default]
    Cycling,
    MountainBiking,
    RoadCycling,
    Gravel,
    EBike,
    Hiking,
    Running,
    Walking,
    Driving,
    Motorcycle,
    PublicTransport,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 12] = [
        ActivityType::Cycling,
        ActivityType::MountainBiking,
        ActivityType::RoadCycling,
        ActivityType::Gravel,
        ActivityType::EBike,
        ActivityType::Hiking,
        ActivityType::Running,
        ActivityType::Walking,
        ActivityType::Driving,
        ActivityType::Motorcycle,
        ActivityType::PublicTransport,
        ActivityType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Cycling => "CYCLING",
            ActivityType::MountainBiking => "MOUNTAIN_BIKING",
            ActivityType::RoadCycling => "ROAD_CYCLING",
            ActivityType::Gravel => "GRAVEL",
            ActivityType::EBike => "E_BIKE",
            ActivityType::Hiking => "HIKING",
            ActivityType::Running => "RUNNING",
            ActivityType::Walking => "WALKING",
            ActivityType::Driving => "DRIVING",
            ActivityType::Motorcycle => "MOTORCYCLE",
            ActivityType::PublicTransport => "PUBLIC_TRANSPORT",
            ActivityType::Other => "OTHER",
        }
    }

    /// Case-insensitive lookup of an external activity name. Unknown names yield `None`
    /// so the caller can fall back to its own default.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|activity| activity.as_str().eq_ignore_ascii_case(name))
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name).unwrap_or_else(|| {
            let fallback = ActivityType::default();
            tracing::debug!("unknown activity type '{name}', using {}", fallback.as_str());
            fallback
        }))
    }
}

/// A single track, route or way point. Owned by its [`Track`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: PointKind,
    #[serde(default)]
    pub sequence_order: usize,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64, kind: PointKind) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
            name: None,
            description: None,
            kind,
            sequence_order: 0,
        }
    }

    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// GeoJSON position: `[lon, lat]` or `[lon, lat, elevation]`.
    pub fn position(&self) -> Vec<f64> {
        match self.elevation {
            Some(ele) => vec![self.longitude, self.latitude, ele],
            None => vec![self.longitude, self.latitude],
        }
    }

    pub fn is_named_waypoint(&self) -> bool {
        self.kind == PointKind::Waypoint && self.name.is_some()
    }
}

/// Derived route statistics. `None` means "not supplied, compute it".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStatistics {
    #[serde(default)]
    pub total_distance_meters: Option<f64>,
    #[serde(default)]
    pub total_elevation_gain_meters: Option<f64>,
    #[serde(default)]
    pub estimated_duration_seconds: Option<u64>,
}

impl TrackStatistics {
    pub fn is_complete(&self) -> bool {
        self.total_distance_meters.is_some()
            && self.total_elevation_gain_meters.is_some()
            && self.estimated_duration_seconds.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    pub description: Option<String>,
    pub activity_type: ActivityType,
    points: Vec<Point>,
    #[serde(flatten)]
    pub statistics: TrackStatistics,
}

impl Track {
    pub fn new(name: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            name: name.into(),
            description: None,
            activity_type,
            points: Vec::new(),
            statistics: TrackStatistics::default(),
        }
    }

    /// Append a point; its sequence order becomes its position in the track.
    pub fn push(&mut self, mut point: Point) {
        point.sequence_order = self.points.len();
        self.points.push(point);
    }

    pub fn extend(&mut self, points: impl IntoIterator<Item = Point>) {
        for point in points {
            self.push(point);
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Deserialization goes through this record so that incoming sequence orders are
/// normalized to insertion order.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackRecord {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    activity_type: ActivityType,
    #[serde(default)]
    points: Vec<Point>,
    #[serde(flatten)]
    statistics: TrackStatistics,
}

impl<'de> Deserialize<'de> for Track {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let record = TrackRecord::deserialize(deserializer)?;
        let mut track = Track::new(record.name, record.activity_type);
        track.description = record.description;
        track.statistics = record.statistics;
        track.extend(record.points);
        Ok(track)
    }
}
