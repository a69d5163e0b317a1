//! # Cachelab Node
//!
//! HTTP origin for the caching lab. It serves one versioned resource under
//! four caching disciplines and answers conditional requests with
//! `304 Not Modified` when the client's validator is still current.
//!
//! ## Routes
//!
//! | Route | Cache-Control | Validator |
//! |---|---|---|
//! | `GET /api/no-store` | `no-store` | none |
//! | `GET /api/etag` | `no-cache` | `ETag` / `If-None-Match` |
//! | `GET /api/last-modified` | `no-cache` | `Last-Modified` / `If-Modified-Since` |
//! | `GET /api/max-age` | `max-age=N` | none |
//! | `POST /api/update` | `no-store` | bumps the resource version |
//! | `GET /api/status` | `no-store` | none |
//! | `GET /1` .. `/4` | as above | time-bucket validators |
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin cachelab-node -- --api-addr 127.0.0.1:3100
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Router, handlers and application state
//! - [`cache_headers`] - Directive and validator header mapping
//! - [`config`] - Layered node configuration
//! - [`health`] - Liveness and readiness probes
//! - [`observability`] - Structured logging, metrics, and request IDs
//! - [`validation`] - Update request validation
//!
//! ## Example: Creating an AppState
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cachelab_core::{CachingResourceService, ServiceConfig};
//! use cachelab_node::api::{create_router, AppState};
//!
//! let service = Arc::new(CachingResourceService::new(ServiceConfig::default()));
//! let app = create_router(AppState::new(service, 30));
//! ```

pub mod api;
pub mod cache_headers;
pub mod config;
pub mod health;
pub mod observability;
pub mod validation;
