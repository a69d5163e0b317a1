//! # Observability Module
//!
//! - **Structured Logging**: pretty or JSON logs via `tracing`
//! - **Prometheus Metrics**: HTTP and cache-decision metrics
//! - **Request Tracing**: request IDs on every span and response
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::{middleware, Router};
//! use cachelab_node::observability::{init_logging, request_id_middleware, LogFormat};
//!
//! init_logging("info", LogFormat::Pretty);
//!
//! let app: Router<()> = Router::new()
//!     .layer(middleware::from_fn(request_id_middleware));
//! ```

mod logging;
mod metrics;
pub mod middleware;

pub use logging::{default_filter, init_logging, LogFormat};
pub use metrics::{MetricsState, METRICS};
pub use middleware::{
    metrics_handler, metrics_middleware, request_id_middleware, RequestId, REQUEST_ID_HEADER,
};
