//! HTTP API for the Cachelab node.
//!
//! Each `/api/*` route serves the versioned resource under one caching
//! discipline. The numbered step routes serve the time-bucket variants,
//! where validators follow the clock instead of the resource.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cachelab_core::{
    CacheDecision, CacheDirective, CachingResourceService, Discipline, Representation,
    VersionedResource,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache_headers::{add_cache_headers, CachedResponse};
use crate::health::{health_routes, HealthState};
use crate::observability::{metrics_handler, metrics_middleware, request_id_middleware, METRICS};
use crate::validation::{validate_update, ValidationErrorResponse, MAX_BODY_BYTES};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The caching resource service.
    pub service: Arc<CachingResourceService>,
    /// TTL advertised by the max-age routes.
    pub max_age_seconds: u64,
    /// Allow cross-origin requests from any origin.
    pub cors_allow_any: bool,
    /// Health probe state.
    pub health: HealthState,
}

impl AppState {
    /// Creates state around a service. Readiness starts unset.
    pub fn new(service: Arc<CachingResourceService>, max_age_seconds: u64) -> Self {
        let health = HealthState::new(service.clone());
        METRICS.set_resource_version(service.snapshot().version);
        Self {
            service,
            max_age_seconds,
            cors_allow_any: true,
            health,
        }
    }
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),
    #[error("resource unavailable: {0}")]
    Unavailable(String),
}

impl From<cachelab_core::Error> for ApiError {
    fn from(err: cachelab_core::Error) -> Self {
        match err {
            cachelab_core::Error::ResourceUnavailable(reason) => ApiError::Unavailable(reason),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        match self {
            ApiError::Validation(errors) => ValidationErrorResponse::from(errors).into_response(),
            ApiError::Json(rejection) => (
                status,
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            )
                .into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Request to replace the resource content.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    /// New content; a placeholder is generated when absent.
    #[serde(default)]
    pub content: Option<String>,
}

/// Response to an update.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub new_data: ResourceStatus,
}

/// Current resource state.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub content: String,
    pub version: u64,
    pub last_modified: String,
    pub etag: String,
}

impl From<&VersionedResource> for ResourceStatus {
    fn from(resource: &VersionedResource) -> Self {
        Self {
            content: resource.content.clone(),
            version: resource.version,
            last_modified: resource.last_modified.to_http_string(),
            etag: resource.etag().to_string(),
        }
    }
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(index))
        // Resource-backed disciplines
        .route("/api/no-store", get(no_store))
        .route("/api/etag", get(etag))
        .route("/api/last-modified", get(last_modified))
        .route("/api/max-age", get(max_age))
        .route("/api/update", post(update))
        .route("/api/status", get(status))
        // Time-bucket steps
        .route("/1", get(no_store))
        .route("/2", get(step_etag))
        .route("/3", get(step_last_modified))
        .route("/4", get(step_max_age))
        .route("/metrics", get(metrics_handler))
        .merge(health_routes(state.health.clone()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    let router = if state.cors_allow_any {
        router.layer(cors_layer())
    } else {
        router
    };

    router.with_state(state)
}

/// CORS policy letting browser clients read validators.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::ETAG, header::LAST_MODIFIED, header::CACHE_CONTROL])
}

fn client_validator(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn decided(discipline: Discipline, decision: CacheDecision) -> CachedResponse {
    METRICS.record_cache_decision(discipline, decision.is_not_modified());
    decision.into()
}

fn represented(discipline: Discipline, representation: Representation) -> CachedResponse {
    METRICS.record_cache_decision(discipline, false);
    representation.into()
}

/// Lists the available routes.
async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "cachelab",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": {
            "GET /api/no-store": "Cache-Control: no-store",
            "GET /api/etag": "Cache-Control: no-cache, revalidated with If-None-Match",
            "GET /api/last-modified": "Cache-Control: no-cache, revalidated with If-Modified-Since",
            "GET /api/max-age": "Cache-Control: max-age=N",
            "POST /api/update": "replace the resource content",
            "GET /api/status": "current resource state",
            "GET /1../4": "time-bucket variants of the four disciplines",
        }
    }))
}

async fn no_store(State(state): State<AppState>) -> CachedResponse {
    tracing::debug!("Serving no-store representation");
    represented(Discipline::NoStore, state.service.get_no_store())
}

async fn etag(State(state): State<AppState>, headers: HeaderMap) -> CachedResponse {
    let client = client_validator(&headers, header::IF_NONE_MATCH);
    decided(Discipline::ETag, state.service.get_with_etag(client))
}

async fn last_modified(State(state): State<AppState>, headers: HeaderMap) -> CachedResponse {
    let client = client_validator(&headers, header::IF_MODIFIED_SINCE);
    decided(
        Discipline::LastModified,
        state.service.get_with_last_modified(client),
    )
}

async fn max_age(State(state): State<AppState>) -> CachedResponse {
    represented(
        Discipline::MaxAge,
        state.service.get_with_max_age(state.max_age_seconds),
    )
}

async fn step_etag(State(state): State<AppState>, headers: HeaderMap) -> CachedResponse {
    let client = client_validator(&headers, header::IF_NONE_MATCH);
    decided(
        Discipline::ETag,
        state
            .service
            .get_with_time_bucket_etag(client, CacheDirective::NoCache),
    )
}

async fn step_last_modified(State(state): State<AppState>, headers: HeaderMap) -> CachedResponse {
    let client = client_validator(&headers, header::IF_MODIFIED_SINCE);
    decided(
        Discipline::LastModified,
        state.service.get_with_time_bucket_last_modified(client),
    )
}

async fn step_max_age(State(state): State<AppState>, headers: HeaderMap) -> CachedResponse {
    let client = client_validator(&headers, header::IF_NONE_MATCH);
    decided(
        Discipline::MaxAge,
        state
            .service
            .get_with_time_bucket_etag(client, CacheDirective::MaxAge(state.max_age_seconds)),
    )
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .is_some_and(|essence| {
            essence.eq_ignore_ascii_case("application/json")
                || essence.to_ascii_lowercase().ends_with("+json")
        })
}

/// Decodes an update body. An empty body is a request without `content`.
fn parse_update(headers: &HeaderMap, body: &Bytes) -> Result<UpdateRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateRequest::default());
    }
    if !is_json_content_type(headers) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>");
        return Err(ApiError::UnsupportedMediaType(content_type.to_string()));
    }
    let Json(request) = Json::<UpdateRequest>::from_bytes(body)?;
    Ok(request)
}

/// Replaces the resource content.
async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_update(&headers, &body)?;
    validate_update(request.content.as_deref())?;

    let next = state.service.update(request.content);
    METRICS.set_resource_version(next.version);

    let mut response = Json(UpdateResponse {
        success: true,
        new_data: ResourceStatus::from(next.as_ref()),
    })
    .into_response();
    add_cache_headers(&mut response, CacheDirective::NoStore);
    Ok(response)
}

/// Returns the current resource state.
async fn status(State(state): State<AppState>) -> Response {
    let snapshot = state.service.snapshot();
    let mut response = Json(ResourceStatus::from(snapshot.as_ref())).into_response();
    add_cache_headers(&mut response, CacheDirective::NoStore);
    response
}
