//! Caching directives, representations, and per-request decisions.

use crate::validator::Validator;
use crate::{ETag, HttpDate};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a response may be stored and reused.
///
/// Wire formatting lives in the transport; the core only picks a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDirective {
    /// Never store; every use goes to the origin.
    NoStore,
    /// Store, but revalidate with the origin before each reuse.
    NoCache,
    /// Reuse without revalidation for this many seconds.
    MaxAge(u64),
}

/// The caching discipline a request was served under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Discipline {
    /// `Cache-Control: no-store`.
    NoStore,
    /// `no-cache` revalidated by `ETag`.
    #[serde(rename = "etag")]
    ETag,
    /// `no-cache` revalidated by `Last-Modified`.
    LastModified,
    /// `max-age=N`.
    MaxAge,
}

impl Discipline {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoStore => "no-store",
            Self::ETag => "etag",
            Self::LastModified => "last-modified",
            Self::MaxAge => "max-age",
        }
    }
}

/// Body of a fresh response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// Discipline the payload was generated for.
    pub discipline: Discipline,
    /// When the payload was generated.
    pub generated_at: DateTime<Utc>,
    /// Random marker, unique per generated payload.
    pub nonce: String,
    /// Filler text of varying length.
    pub data: String,
    /// Resource content, for disciplines backed by the versioned resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Resource version, for disciplines backed by the versioned resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Validator value sent alongside the payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

/// A full response body plus the directive to mark it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    /// The body.
    pub payload: Payload,
    /// How the response may be cached.
    pub directive: CacheDirective,
}

/// Outcome of a conditional request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// Serve a full representation with its validator.
    Fresh {
        /// The representation to send.
        representation: Representation,
        /// The current validator.
        validator: Validator,
    },
    /// The client's copy is current; respond `304` without a body.
    NotModified {
        /// The validator the client already holds.
        validator: Validator,
        /// The directive a full response would have carried.
        directive: CacheDirective,
    },
}

impl CacheDecision {
    /// Returns true for [`CacheDecision::NotModified`].
    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified { .. })
    }

    /// Returns the current validator.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        match self {
            Self::Fresh { validator, .. } | Self::NotModified { validator, .. } => validator,
        }
    }

    /// Returns the caching directive, which a `304` repeats.
    #[must_use]
    pub fn directive(&self) -> CacheDirective {
        match self {
            Self::Fresh { representation, .. } => representation.directive,
            Self::NotModified { directive, .. } => *directive,
        }
    }

    /// Returns the entity tag, if the decision is ETag based.
    #[must_use]
    pub fn etag(&self) -> Option<&ETag> {
        match self.validator() {
            Validator::ETag(tag) => Some(tag),
            Validator::LastModified(_) => None,
        }
    }

    /// Returns the modification date, if the decision is date based.
    #[must_use]
    pub fn last_modified(&self) -> Option<HttpDate> {
        match self.validator() {
            Validator::LastModified(date) => Some(*date),
            Validator::ETag(_) => None,
        }
    }

    /// Returns the representation for fresh decisions.
    #[must_use]
    pub fn representation(&self) -> Option<&Representation> {
        match self {
            Self::Fresh { representation, .. } => Some(representation),
            Self::NotModified { .. } => None,
        }
    }
}
