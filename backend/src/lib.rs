pub mod config;
pub mod error;
pub mod geojson_codec;
pub mod geometry;
pub mod gpx_codec;
pub mod handlers;
pub mod lookup;
pub mod models;
pub mod road_type;
pub mod segmentation;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::lookup::RoadTagLookup;

#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<dyn RoadTagLookup>,
    /// Pause between consecutive road lookups of one analysis.
    pub lookup_delay: Duration,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/routes/analyze", post(handlers::analyze_route))
        .route("/api/routes/statistics", post(handlers::route_statistics))
        .route("/api/routes/import/gpx", post(handlers::import_gpx_route))
        .route("/api/routes/import/geojson", post(handlers::import_geojson_route))
        .route("/api/routes/export/gpx", post(handlers::export_gpx_route))
        .route("/api/routes/export/geojson", post(handlers::export_geojson_route))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
