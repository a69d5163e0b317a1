//! # Health Check Module
//!
//! - **Liveness Probe**: Is the process running?
//! - **Readiness Probe**: Is the server accepting traffic? Set once the
//!   listener is bound, cleared when shutdown begins.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::Router;
//! use cachelab_node::health::{health_routes, HealthState};
//!
//! let health_state = HealthState::new(service.clone());
//! health_state.set_ready(true);
//!
//! let app: Router<()> = Router::new()
//!     .merge(health_routes(health_state));
//! ```

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cachelab_core::{CachingResourceService, HttpDate};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Health status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is healthy.
    Up,
    /// Component is unhealthy.
    Down,
}

/// State of the served resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    /// Current version.
    pub version: u64,
    /// Current modification date.
    pub last_modified: HttpDate,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Overall health response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Version info.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Served resource.
    pub resource: ResourceInfo,
}

/// Health state for tracking readiness.
#[derive(Clone)]
pub struct HealthState {
    start_time: Instant,
    ready: Arc<AtomicBool>,
    service: Arc<CachingResourceService>,
}

impl HealthState {
    /// Create a new health state, not yet ready.
    pub fn new(service: Arc<CachingResourceService>) -> Self {
        Self {
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
            service,
        }
    }

    /// Get uptime in seconds.
    pub fn uptime(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Set readiness state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if service is ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn resource(&self) -> ResourceInfo {
        let snapshot = self.service.snapshot();
        ResourceInfo {
            version: snapshot.version,
            last_modified: snapshot.last_modified,
        }
    }

    fn overall(&self) -> HealthStatus {
        if self.is_ready() {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        }
    }
}

/// Create health check routes.
pub fn health_routes<S>(state: HealthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
}

fn status_code(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Overall health handler.
async fn health_handler(State(state): State<HealthState>) -> Response {
    let status = state.overall();

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime(),
        resource: state.resource(),
    };

    (status_code(status), Json(response)).into_response()
}

/// Liveness probe handler.
async fn liveness_handler(State(state): State<HealthState>) -> Response {
    let response = LivenessResponse {
        status: HealthStatus::Up,
        uptime_seconds: state.uptime(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness probe handler.
async fn readiness_handler(State(state): State<HealthState>) -> Response {
    let status = state.overall();

    (
        status_code(status),
        Json(serde_json::json!({ "status": status, "resource": state.resource() })),
    )
        .into_response()
}
