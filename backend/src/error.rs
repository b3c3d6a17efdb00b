use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to parse GPX document: {0}")]
    MalformedGpx(#[source] gpx::errors::GpxError),
    #[error("failed to parse GeoJSON document: {0}")]
    MalformedGeoJson(#[from] geojson::Error),
    #[error("failed to build GPX document: {0}")]
    GpxWrite(#[source] gpx::errors::GpxError),
    #[error("failed to serialize GeoJSON document: {0}")]
    GeoJsonWrite(#[from] serde_json::Error),
    #[error("{format} file contains no valid track points, waypoints, or route points")]
    NoValidPoints { format: &'static str },
}

impl TrackError {
    /// Whether the caller sent something unusable, as opposed to an encoder failure.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            TrackError::MalformedGpx(_)
                | TrackError::MalformedGeoJson(_)
                | TrackError::NoValidPoints { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("road lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("road lookup service answered with status {0}")]
    Status(u16),
}
