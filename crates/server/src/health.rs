//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of the last fetch from one upstream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: String,
    pub up: bool,
    pub checked_at: String,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl SourceStatus {
    pub fn up(source: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            source: source.into(),
            up: true,
            checked_at: Utc::now().to_rfc3339(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn down(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            up: false,
            checked_at: Utc::now().to_rfc3339(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

/// Shared state for health checks, typically behind `Arc<HealthState>`
pub struct HealthState {
    pub service_name: String,
    pub start_time: Instant,
    sources: RwLock<Vec<SourceStatus>>,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            start_time: Instant::now(),
            sources: RwLock::new(Vec::new()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Replace the entry for `status.source`
    pub fn update_source(&self, status: SourceStatus) {
        let mut sources = self.sources.write();
        sources.retain(|s| s.source != status.source);
        sources.push(status);
    }

    pub fn sources(&self) -> Vec<SourceStatus> {
        self.sources.read().clone()
    }

    /// Every source reported up (vacuously true before the first fetch)
    pub fn is_healthy(&self) -> bool {
        self.sources.read().iter().all(|s| s.up)
    }
}

/// Liveness: always 200 while the process serves requests
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Source-level health; 503 when any source is down
pub async fn detailed_health_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<Value>) {
    let sources = state.sources();
    let all_up = sources.iter().all(|s| s.up);
    let status_code = if all_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health = json!({
        "status": if all_up { "healthy" } else { "degraded" },
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "sources": sources,
        "healthy": all_up,
    });

    (status_code, Json(health))
}

/// `/health` and `/health/detailed`
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/detailed", get(detailed_health_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_health_state() {
        let state = HealthState::new("stablemap");
        assert!(state.is_healthy());

        state.update_source(SourceStatus::up("coingecko", 120));
        assert!(state.is_healthy());

        state.update_source(SourceStatus::down("defillama", "HTTP 502"));
        assert!(!state.is_healthy());
        assert_eq!(state.sources().len(), 2);

        state.update_source(SourceStatus::up("defillama", 80));
        assert!(state.is_healthy());
        assert_eq!(state.sources().len(), 2);
    }

    #[tokio::test]
    async fn test_detailed_health_degraded() {
        let state = Arc::new(HealthState::new("stablemap"));
        state.update_source(SourceStatus::down("coingecko", "rate limited"));
        let app = health_routes(state);

        let response = app
            .clone()
            .oneshot(Request::get("/health/detailed").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
