//! Cache validators.

use crate::HttpDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// An entity tag, stored in its quoted wire form (`"<hex>"`).
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Computes the tag for a versioned representation.
    ///
    /// The digest covers `content`, a `-` separator, then the decimal
    /// version, so equal inputs always produce equal tags.
    #[must_use]
    pub fn for_version(content: &str, version: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hasher.update(b"-");
        hasher.update(version.to_string().as_bytes());
        Self::from_digest(&hasher.finalize())
    }

    /// Computes the tag for a time bucket.
    ///
    /// Every request that lands in the same bucket shares a tag.
    #[must_use]
    pub fn for_time_bucket(bucket: HttpDate) -> Self {
        let digest = Sha256::digest(bucket.to_http_string().as_bytes());
        Self::from_digest(&digest)
    }

    fn from_digest(digest: &[u8]) -> Self {
        Self(format!("\"{}\"", hex::encode(digest)))
    }

    /// Returns the quoted tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strict comparison against an `If-None-Match` value.
    ///
    /// Byte-exact and case-sensitive: lists, `*`, and `W/` prefixes never match.
    #[must_use]
    pub fn matches(&self, client: &str) -> bool {
        self.0 == client
    }
}

impl fmt::Debug for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ETag({})", self.0)
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The validator attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// Sent as `ETag`, checked against `If-None-Match`.
    ETag(ETag),
    /// Sent as `Last-Modified`, checked against `If-Modified-Since`.
    LastModified(HttpDate),
}
