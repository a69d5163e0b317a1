//! Prometheus metrics collection.
//!
//! Provides metrics for:
//! - HTTP request latency and counts
//! - Cache decisions per discipline and outcome
//! - The current resource version

use cachelab_core::Discipline;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::Arc;

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path
    pub path: String,
    /// Response status code
    pub status: u16,
}

/// Cache decision labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CacheLabels {
    /// Caching discipline (no-store, etag, last-modified, max-age)
    pub discipline: String,
    /// Outcome (fresh, not_modified)
    pub outcome: String,
}

/// Global metrics state.
pub static METRICS: Lazy<MetricsState> = Lazy::new(MetricsState::new);

/// Metrics state container.
#[derive(Clone)]
pub struct MetricsState {
    /// Prometheus registry.
    pub registry: Arc<RwLock<Registry>>,
    /// HTTP request counter.
    pub http_requests_total: Family<HttpLabels, Counter>,
    /// HTTP request duration histogram (seconds).
    pub http_request_duration_seconds: Family<HttpLabels, Histogram>,
    /// HTTP active connections gauge.
    pub http_active_connections: Gauge,
    /// Cache decisions by discipline and outcome.
    pub cache_decisions_total: Family<CacheLabels, Counter>,
    /// Current resource version.
    pub resource_version: Gauge,
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsState {
    /// Create a new metrics state with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Family::<HttpLabels, Counter>::default();
        registry.register(
            "cachelab_http_requests",
            "Total HTTP requests",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<HttpLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.0001, 2.0, 16))
            });
        registry.register(
            "cachelab_http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_active_connections = Gauge::default();
        registry.register(
            "cachelab_http_active_connections",
            "Number of in-flight HTTP requests",
            http_active_connections.clone(),
        );

        let cache_decisions_total = Family::<CacheLabels, Counter>::default();
        registry.register(
            "cachelab_cache_decisions",
            "Cache decisions by discipline and outcome",
            cache_decisions_total.clone(),
        );

        let resource_version = Gauge::default();
        registry.register(
            "cachelab_resource_version",
            "Current version of the served resource",
            resource_version.clone(),
        );

        Self {
            registry: Arc::new(RwLock::new(registry)),
            http_requests_total,
            http_request_duration_seconds,
            http_active_connections,
            cache_decisions_total,
            resource_version,
        }
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };

        self.http_requests_total.get_or_create(&labels).inc();
        self.http_request_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Record a cache decision.
    pub fn record_cache_decision(&self, discipline: Discipline, not_modified: bool) {
        let labels = CacheLabels {
            discipline: discipline.as_str().to_string(),
            outcome: if not_modified { "not_modified" } else { "fresh" }.to_string(),
        };
        self.cache_decisions_total.get_or_create(&labels).inc();
    }

    /// Set the resource version gauge.
    pub fn set_resource_version(&self, version: u64) {
        self.resource_version
            .set(i64::try_from(version).unwrap_or(i64::MAX));
    }

    /// Encode metrics for Prometheus scraping.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        let registry = self.registry.read();
        prometheus_client::encoding::text::encode(&mut buffer, &registry)?;
        Ok(buffer)
    }
}
