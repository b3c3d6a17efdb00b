use serde::{Deserialize, Serialize};

/// Internal road classification. External OSM `highway` tags map onto these
/// through [`classify`]; new tags only need an entry in that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoadType {
    Highway,
    Arterial,
    #[default]
    PavedRoad,
    Residential,
    BikeLane,
    BikePath,
    SharedUsePath,
    GravelRoad,
    DirtRoad,
    Trail,
    SingleTrack,
    Bridge,
    Tunnel,
    Ferry,
    Boardwalk,
    Stairs,
    PedestrianOnly,
}

impl RoadType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoadType::Highway => "HIGHWAY",
            RoadType::Arterial => "ARTERIAL",
            RoadType::PavedRoad => "PAVED_ROAD",
            RoadType::Residential => "RESIDENTIAL",
            RoadType::BikeLane => "BIKE_LANE",
            RoadType::BikePath => "BIKE_PATH",
            RoadType::SharedUsePath => "SHARED_USE_PATH",
            RoadType::GravelRoad => "GRAVEL_ROAD",
            RoadType::DirtRoad => "DIRT_ROAD",
            RoadType::Trail => "TRAIL",
            RoadType::SingleTrack => "SINGLE_TRACK",
            RoadType::Bridge => "BRIDGE",
            RoadType::Tunnel => "TUNNEL",
            RoadType::Ferry => "FERRY",
            RoadType::Boardwalk => "BOARDWALK",
            RoadType::Stairs => "STAIRS",
            RoadType::PedestrianOnly => "PEDESTRIAN_ONLY",
        }
    }

    /// Display color as a `#RRGGBB` string.
    pub fn color(self) -> &'static str {
        color_of(self)
    }
}

impl std::fmt::Display for RoadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an OSM `highway` value to a road type. Absent, empty or unknown tags
/// fall back to [`RoadType::PavedRoad`].
pub fn classify(highway: Option<&str>) -> RoadType {
    let Some(tag) = highway.map(str::trim).filter(|tag| !tag.is_empty()) else {
        tracing::debug!("no highway tag, defaulting to {}", RoadType::PavedRoad);
        return RoadType::PavedRoad;
    };

    let road_type = match tag.to_ascii_lowercase().as_str() {
        "motorway" | "motorway_link" | "trunk" | "trunk_link" => RoadType::Highway,
        "primary" | "primary_link" | "secondary" | "secondary_link" => RoadType::Arterial,
        "tertiary" | "tertiary_link" | "service" | "unclassified" | "road" => {
            RoadType::PavedRoad
        }
        "residential" | "living_street" => RoadType::Residential,
        "cycleway" => RoadType::BikePath,
        "path" => RoadType::SharedUsePath,
        "track" => RoadType::GravelRoad,
        "footway" | "pedestrian" => RoadType::PedestrianOnly,
        "steps" => RoadType::Stairs,
        "bridleway" => RoadType::Trail,
        _ => RoadType::PavedRoad,
    };

    tracing::debug!("mapped highway '{tag}' to {road_type}");
    road_type
}

pub fn color_of(road_type: RoadType) -> &'static str {
    match road_type {
        RoadType::Highway => "#FF0000",
        RoadType::Arterial => "#FF4500",
        RoadType::PavedRoad => "#FFA500",
        RoadType::Residential => "#FFFF00",
        RoadType::BikeLane => "#00FF00",
        RoadType::BikePath => "#32CD32",
        RoadType::SharedUsePath => "#00CED1",
        RoadType::GravelRoad => "#8B4513",
        RoadType::DirtRoad => "#A0522D",
        RoadType::Trail => "#228B22",
        RoadType::SingleTrack => "#006400",
        RoadType::Bridge => "#4169E1",
        RoadType::Tunnel => "#483D8B",
        RoadType::Ferry => "#1E90FF",
        RoadType::Boardwalk => "#DEB887",
        RoadType::Stairs => "#808080",
        RoadType::PedestrianOnly => "#FF69B4",
    }
}
