use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LookupError;
use crate::models::Point;
use crate::road_type::{classify, RoadType};

const USEFUL_TAGS: [&str; 8] = [
    "smoothness",
    "trail_visibility",
    "sac_scale",
    "mtb:scale",
    "width",
    "incline",
    "lit",
    "segregated",
];

/// Road attributes found at a coordinate. Only `highway` drives classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadTag {
    pub highway: Option<String>,
    pub surface: Option<String>,
    pub bicycle: Option<String>,
    pub name: Option<String>,
    pub max_speed_kmh: Option<u32>,
    pub lanes: Option<String>,
    pub is_tunnel: bool,
    pub is_bridge: bool,
    pub additional_tags: HashMap<String, String>,
}

impl RoadTag {
    pub fn highway(tag: impl Into<String>) -> Self {
        Self {
            highway: Some(tag.into()),
            ..Default::default()
        }
    }
}

/// Source of road tags for a coordinate (reverse geocoder, Overpass, fixture, ...).
#[async_trait]
pub trait RoadTagLookup: Send + Sync {
    async fn lookup(&self, lat: f64, lon: f64) -> Result<Option<RoadTag>, LookupError>;
}

/// Lookup that never knows anything; every point classifies to the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl RoadTagLookup for NoLookup {
    async fn lookup(&self, _lat: f64, _lon: f64) -> Result<Option<RoadTag>, LookupError> {
        Ok(None)
    }
}

/// Nominatim reverse-geocoding client.
#[derive(Debug, Clone)]
pub struct NominatimLookup {
    http: reqwest::Client,
    endpoint: String,
}

impl NominatimLookup {
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RoadTagLookup for NominatimLookup {
    async fn lookup(&self, lat: f64, lon: f64) -> Result<Option<RoadTag>, LookupError> {
        tracing::debug!("reverse lookup at {lat},{lon}");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("zoom", "17".to_string()),
                ("extratags", "1".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let payload: NominatimResponse = response.json().await?;
        Ok(parse_nominatim_response(&payload))
    }
}

/// The parts of a Nominatim `reverse` answer that describe the road.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub osm_value: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub extratags: Option<HashMap<String, String>>,
}

impl NominatimResponse {
    fn tag(&self, key: &str) -> Option<String> {
        self.extratags.as_ref()?.get(key).cloned()
    }
}

/// Decode a Nominatim `reverse` payload. `None` when the payload describes nothing
/// (e.g. an `error` answer for coordinates in the sea).
pub fn parse_nominatim_response(response: &NominatimResponse) -> Option<RoadTag> {
    if response.error.is_some() {
        return None;
    }

    let mut highway = response.tag("highway");
    if highway.is_none() && response.class.as_deref() == Some("highway") {
        highway = response
            .osm_value
            .clone()
            .or_else(|| {
                response
                    .kind
                    .clone()
                    .filter(|t| t != "road" && t != "way")
            })
            .or_else(|| Some("unclassified".to_string()));
    }

    let additional_tags = USEFUL_TAGS
        .iter()
        .filter_map(|&key| response.tag(key).map(|v| (key.to_string(), v)))
        .collect();

    Some(RoadTag {
        highway,
        surface: response.tag("surface"),
        bicycle: response.tag("bicycle"),
        name: response.display_name.clone(),
        max_speed_kmh: response.tag("maxspeed").and_then(|s| parse_max_speed(&s)),
        lanes: response.tag("lanes"),
        is_tunnel: response.tag("tunnel").as_deref() == Some("yes"),
        is_bridge: response.tag("bridge").as_deref() == Some("yes"),
        additional_tags,
    })
}

/// Parse OSM `maxspeed` values such as `"50"`, `"50 km/h"` or `"30 mph"` into km/h.
pub fn parse_max_speed(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let speed: u32 = digits.parse().ok()?;
    if raw.contains("mph") {
        Some((speed as f64 * 1.60934) as u32)
    } else {
        Some(speed)
    }
}

/// Classify every point through `lookup`, one call at a time, sleeping `pacing`
/// between calls. Failed or empty lookups classify to the default road type.
pub async fn classify_points<L>(points: &[Point], lookup: &L, pacing: Duration) -> Vec<RoadType>
where
    L: RoadTagLookup + ?Sized,
{
    let mut road_types = Vec::with_capacity(points.len());
    let mut failures = 0usize;

    for (i, point) in points.iter().enumerate() {
        if i > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        let tag = match lookup.lookup(point.latitude, point.longitude).await {
            Ok(tag) => tag,
            Err(err) => {
                failures += 1;
                tracing::warn!(
                    "road lookup failed at {},{}: {err}",
                    point.latitude,
                    point.longitude
                );
                None
            }
        };

        let road_type = classify(tag.as_ref().and_then(|t| t.highway.as_deref()));
        tracing::debug!(
            "point {i} at {},{} classified as {road_type}",
            point.latitude,
            point.longitude
        );
        road_types.push(road_type);
    }

    if failures > 0 {
        tracing::warn!(
            "{failures} of {} road lookups failed, used default classification",
            points.len()
        );
    }

    road_types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PointKind;
    use serde_json::json;

    fn response(value: serde_json::Value) -> NominatimResponse {
        serde_json::from_value(value).unwrap()
    }

    /// Answers by latitude band and fails for negative latitudes.
    struct BandLookup;

    #[async_trait]
    impl RoadTagLookup for BandLookup {
        async fn lookup(&self, lat: f64, _lon: f64) -> Result<Option<RoadTag>, LookupError> {
            if lat < 0.0 {
                return Err(LookupError::Status(503));
            }
            if lat < 1.0 {
                Ok(Some(RoadTag::highway("cycleway")))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn parses_extratags() {
        let json = response(json!({
            "place_id": 1234,
            "display_name": "Rue de la Paix, Paris",
            "class": "highway",
            "type": "residential",
            "extratags": {
                "highway": "cycleway",
                "surface": "asphalt",
                "maxspeed": "30 mph",
                "bridge": "yes",
                "lit": "yes"
            }
        }));
        let tag = parse_nominatim_response(&json).unwrap();

        assert_eq!(tag.highway.as_deref(), Some("cycleway"));
        assert_eq!(tag.surface.as_deref(), Some("asphalt"));
        assert_eq!(tag.max_speed_kmh, Some(48));
        assert!(tag.is_bridge);
        assert!(!tag.is_tunnel);
        assert_eq!(tag.additional_tags.get("lit").map(String::as_str), Some("yes"));
        assert_eq!(tag.name.as_deref(), Some("Rue de la Paix, Paris"));
    }

    #[test]
    fn falls_back_to_highway_class() {
        let json = response(json!({"class": "highway", "type": "road", "extratags": {}}));
        let tag = parse_nominatim_response(&json).unwrap();
        assert_eq!(tag.highway.as_deref(), Some("unclassified"));

        let json = response(json!({"class": "highway", "type": "tertiary", "extratags": null}));
        let tag = parse_nominatim_response(&json).unwrap();
        assert_eq!(tag.highway.as_deref(), Some("tertiary"));
    }

    #[test]
    fn error_payload_is_unknown() {
        let json = response(json!({"error": "Unable to geocode"}));
        assert_eq!(parse_nominatim_response(&json), None);
    }

    #[test]
    fn max_speed_formats() {
        assert_eq!(parse_max_speed("50"), Some(50));
        assert_eq!(parse_max_speed("50 km/h"), Some(50));
        assert_eq!(parse_max_speed("20 mph"), Some(32));
        assert_eq!(parse_max_speed("signals"), None);
    }

    #[tokio::test]
    async fn failed_lookups_use_default_classification() {
        let points = vec![
            Point::new(0.5, 5.0, PointKind::TrackPoint),
            Point::new(-0.5, 5.0, PointKind::TrackPoint),
            Point::new(2.0, 5.0, PointKind::TrackPoint),
        ];
        let types = classify_points(&points, &BandLookup, Duration::ZERO).await;
        assert_eq!(
            types,
            vec![RoadType::BikePath, RoadType::PavedRoad, RoadType::PavedRoad]
        );
    }

    #[tokio::test]
    async fn no_lookup_classifies_everything_as_default() {
        let points = vec![Point::new(45.0, 5.0, PointKind::TrackPoint); 3];
        let types = classify_points(&points, &NoLookup, Duration::ZERO).await;
        assert_eq!(types, vec![RoadType::PavedRoad; 3]);
    }
}
