use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::error::LookupError;
use crate::lookup::{NoLookup, NominatimLookup, RoadTagLookup};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Track statistics, road-type analysis and GPX/GeoJSON conversion service"
)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "TRACKOSS_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Reverse-geocoding endpoint used for road-type lookups
    #[arg(long, env = "NOMINATIM_URL", default_value = DEFAULT_NOMINATIM_URL)]
    pub nominatim_url: String,

    /// Per-request timeout of a road lookup, in milliseconds
    #[arg(long, env = "LOOKUP_TIMEOUT_MS", default_value_t = 5000)]
    pub lookup_timeout_ms: u64,

    /// Pause between consecutive road lookups, in milliseconds
    #[arg(long, env = "LOOKUP_DELAY_MS", default_value_t = 100)]
    pub lookup_delay_ms: u64,

    #[arg(long, env = "TRACKOSS_USER_AGENT", default_value = concat!("trackoss-engine/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Skip road lookups entirely; every point gets the default road type
    #[arg(long, env = "TRACKOSS_OFFLINE")]
    pub offline: bool,
}

impl ServerConfig {
    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_delay_ms)
    }

    pub fn build_lookup(&self) -> Result<Arc<dyn RoadTagLookup>, LookupError> {
        if self.offline {
            tracing::info!("offline mode, road lookups disabled");
            return Ok(Arc::new(NoLookup));
        }

        let lookup = NominatimLookup::new(
            self.nominatim_url.clone(),
            &self.user_agent,
            Duration::from_millis(self.lookup_timeout_ms),
        )?;
        tracing::info!("road lookups via {}", self.nominatim_url);
        Ok(Arc::new(lookup))
    }
}
