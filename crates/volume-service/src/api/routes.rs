//! Axum route definitions.

use axum::routing::get;
use axum::Router;
use server::health_routes;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::service::VolumeService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// # Routes
///
/// - `GET /api/v1/volume?filter=all|usdt|usdc|dai`
/// - `GET /api/v1/regulations`
/// - `GET /api/v1/regulations/stats`
/// - `GET /api/v1/regulations/:iso2`
pub fn volume_routes(service: Arc<VolumeService>) -> Router {
    Router::new()
        .route("/api/v1/volume", get(handlers::get_volume))
        .route("/api/v1/regulations", get(handlers::list_regulations))
        .route("/api/v1/regulations/stats", get(handlers::regulation_stats))
        .route("/api/v1/regulations/:iso2", get(handlers::get_regulation))
        .with_state(service)
}

/// Volume routes plus `/health`, with tracing, permissive CORS for browser
/// map clients, and a request timeout
pub fn app_router(service: Arc<VolumeService>) -> Router {
    let health = Arc::clone(service.health());
    Router::new()
        .merge(volume_routes(service))
        .merge(health_routes(health))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
