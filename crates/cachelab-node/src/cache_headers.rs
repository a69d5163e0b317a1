//! Mapping of cache decisions onto HTTP responses.
//!
//! The core hands back typed directives and validators; this module is the
//! only place they become header strings.

use axum::{
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use cachelab_core::{CacheDecision, CacheDirective, Representation, Validator};

/// Converts a directive to a `Cache-Control` header value.
pub fn cache_control_value(directive: CacheDirective) -> HeaderValue {
    match directive {
        CacheDirective::NoStore => HeaderValue::from_static("no-store"),
        CacheDirective::NoCache => HeaderValue::from_static("no-cache"),
        CacheDirective::MaxAge(secs) => HeaderValue::from_str(&format!("max-age={secs}"))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache")),
    }
}

/// Sets `Cache-Control` on a response.
pub fn add_cache_headers<B>(response: &mut Response<B>, directive: CacheDirective) {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, cache_control_value(directive));
}

/// Sets `ETag` or `Last-Modified` on a response.
pub fn add_validator<B>(response: &mut Response<B>, validator: &Validator) {
    let (name, value) = match validator {
        Validator::ETag(tag) => (header::ETAG, HeaderValue::from_str(tag.as_str())),
        Validator::LastModified(date) => (
            header::LAST_MODIFIED,
            HeaderValue::from_str(&date.to_http_string()),
        ),
    };
    match value {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(e) => tracing::warn!(header = %name, error = %e, "Dropping unencodable validator"),
    }
}

/// A response produced by the caching service.
#[derive(Debug)]
pub enum CachedResponse {
    /// A conditional decision.
    Decision(CacheDecision),
    /// An unconditional representation.
    Representation(Representation),
}

impl From<CacheDecision> for CachedResponse {
    fn from(decision: CacheDecision) -> Self {
        Self::Decision(decision)
    }
}

impl From<Representation> for CachedResponse {
    fn from(representation: Representation) -> Self {
        Self::Representation(representation)
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> axum::response::Response {
        match self {
            CachedResponse::Representation(rep) => representation_response(rep),
            CachedResponse::Decision(CacheDecision::Fresh {
                representation,
                validator,
            }) => {
                let mut response = representation_response(representation);
                add_validator(&mut response, &validator);
                response
            }
            CachedResponse::Decision(CacheDecision::NotModified {
                validator,
                directive,
            }) => {
                let mut response = StatusCode::NOT_MODIFIED.into_response();
                add_cache_headers(&mut response, directive);
                add_validator(&mut response, &validator);
                response
            }
        }
    }
}

fn representation_response(rep: Representation) -> axum::response::Response {
    let mut response = (StatusCode::OK, Json(rep.payload)).into_response();
    add_cache_headers(&mut response, rep.directive);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachelab_core::{ETag, HttpDate};
    use proptest::prelude::*;

    #[test]
    fn test_cache_control_values() {
        assert_eq!(cache_control_value(CacheDirective::NoStore), "no-store");
        assert_eq!(cache_control_value(CacheDirective::NoCache), "no-cache");
        assert_eq!(cache_control_value(CacheDirective::MaxAge(30)), "max-age=30");
        assert_eq!(cache_control_value(CacheDirective::MaxAge(0)), "max-age=0");
    }

    #[test]
    fn test_not_modified_repeats_cache_headers() {
        let tag = ETag::for_version("x", 1);
        let response = CachedResponse::Decision(CacheDecision::NotModified {
            validator: Validator::ETag(tag.clone()),
            directive: CacheDirective::MaxAge(30),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], tag.as_str());
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=30");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    proptest! {
        #[test]
        fn prop_max_age_renders_seconds(secs in any::<u64>()) {
            let value = cache_control_value(CacheDirective::MaxAge(secs));
            prop_assert_eq!(value.to_str().unwrap(), format!("max-age={secs}"));
        }
    }

    #[test]
    fn test_last_modified_header() {
        let date = HttpDate::from_unix_secs(784_111_777).unwrap();
        let mut response = Response::new(());
        add_validator(&mut response, &Validator::LastModified(date));
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }
}
