//! # Cachelab Core
//!
//! A single versioned resource served under four HTTP caching disciplines,
//! and the revalidation logic that decides between a full representation
//! and `304 Not Modified`.
//!
//! | Discipline | Directive | Validator |
//! |---|---|---|
//! | no-store | `NoStore` | none |
//! | etag | `NoCache` | [`ETag`] over content and version |
//! | last-modified | `NoCache` | [`HttpDate`] at a fixed granularity |
//! | max-age | `MaxAge(n)` | none |
//!
//! The core never formats headers; transports map [`CacheDirective`] and
//! [`Validator`] to the wire.
//!
//! ## Example
//!
//! ```rust
//! use cachelab_core::{CachingResourceService, ServiceConfig};
//!
//! let service = CachingResourceService::new(ServiceConfig::default());
//!
//! let first = service.get_with_etag(None);
//! let etag = first.etag().unwrap().to_string();
//! assert!(service.get_with_etag(Some(&etag)).is_not_modified());
//!
//! service.update(Some("changed".to_string()));
//! assert!(!service.get_with_etag(Some(&etag)).is_not_modified());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod decision;
pub mod error;
pub mod http_date;
pub mod resource;
pub mod service;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::{CacheDecision, CacheDirective, Discipline, Payload, Representation};
pub use error::{Error, Result};
pub use http_date::HttpDate;
pub use resource::{ResourceStore, VersionedResource};
pub use service::{
    CachingResourceService, ServiceConfig, DEFAULT_INITIAL_CONTENT, MAX_FILLER_REPEATS,
};
pub use validator::{ETag, Validator};
