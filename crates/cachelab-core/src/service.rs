//! The caching resource service.
//!
//! Serves one versioned resource under four caching disciplines and decides,
//! per request, whether a conditional request gets a full representation or
//! a `304 Not Modified`. Every decision is a total function of the current
//! snapshot, the clock, and the client's validator; validators that cannot be
//! interpreted are treated as a cache miss.

use crate::clock::{Clock, SystemClock};
use crate::decision::{CacheDecision, CacheDirective, Discipline, Payload, Representation};
use crate::resource::{ResourceStore, VersionedResource};
use crate::validator::Validator;
use crate::{ETag, Error, HttpDate, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Content the resource starts with.
pub const DEFAULT_INITIAL_CONTENT: &str = "Initial content";

/// Sentence repeated to build filler payloads.
const FILLER_SENTENCE: &str = "Lorem, ipsum dolor sit amet consectetur adipisicing elit. \
Doloribus dicta id, tempora rem accusamus ab ex, ratione ad exercitationem libero laudantium \
fugit reiciendis corrupti quis ipsam dolorum maxime perspiciatis nemo.";

const NONCE_LEN: usize = 8;

/// Upper bound on filler sentences per payload.
pub const MAX_FILLER_REPEATS: usize = 1024;

/// Configuration for [`CachingResourceService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Content of version 1.
    pub initial_content: String,
    /// Resolution of `Last-Modified` dates and time-bucket tags.
    pub last_modified_granularity: Duration,
    /// Fewest filler sentences per payload.
    pub filler_min_repeats: usize,
    /// Most filler sentences per payload.
    pub filler_max_repeats: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            initial_content: DEFAULT_INITIAL_CONTENT.to_string(),
            last_modified_granularity: Duration::from_secs(60),
            filler_min_repeats: 1,
            filler_max_repeats: 3,
        }
    }
}

impl ServiceConfig {
    /// Checks the configuration for values the service cannot honor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.last_modified_granularity < Duration::from_secs(1) {
            return Err(Error::invalid_input(
                "last_modified_granularity",
                "must be at least one second",
            ));
        }
        if self.filler_max_repeats > MAX_FILLER_REPEATS {
            return Err(Error::invalid_input(
                "filler_max_repeats",
                format!(
                    "{} exceeds the limit of {MAX_FILLER_REPEATS}",
                    self.filler_max_repeats
                ),
            ));
        }
        if self.filler_min_repeats > self.filler_max_repeats {
            return Err(Error::invalid_input(
                "filler_min_repeats",
                format!(
                    "{} exceeds filler_max_repeats {}",
                    self.filler_min_repeats, self.filler_max_repeats
                ),
            ));
        }
        Ok(())
    }
}

/// Owns the versioned resource and makes cache decisions for it.
pub struct CachingResourceService {
    store: ResourceStore,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl std::fmt::Debug for CachingResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingResourceService")
            .field("resource", &self.store.snapshot())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CachingResourceService {
    /// Creates a service on the system clock.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a service on the given clock.
    #[must_use]
    pub fn with_clock(config: ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        let created = HttpDate::from(clock.now()).truncate(config.last_modified_granularity);
        let store = ResourceStore::new(config.initial_content.clone(), created);
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns a consistent snapshot of the resource.
    #[must_use]
    pub fn snapshot(&self) -> Arc<VersionedResource> {
        self.store.snapshot()
    }

    /// Always-fresh representation marked `no-store`.
    #[must_use]
    pub fn get_no_store(&self) -> Representation {
        Representation {
            payload: self.payload(Discipline::NoStore, None, None),
            directive: CacheDirective::NoStore,
        }
    }

    /// Revalidates against the resource's entity tag.
    #[must_use]
    pub fn get_with_etag(&self, client: Option<&str>) -> CacheDecision {
        let snap = self.store.snapshot();
        let etag = snap.etag();

        if client.is_some_and(|c| etag.matches(c)) {
            tracing::debug!(etag = %etag, version = snap.version, "ETag matched");
            return CacheDecision::NotModified {
                validator: Validator::ETag(etag),
                directive: CacheDirective::NoCache,
            };
        }

        tracing::debug!(
            etag = %etag,
            client = client.unwrap_or("<none>"),
            version = snap.version,
            "ETag miss"
        );
        CacheDecision::Fresh {
            representation: Representation {
                payload: self.payload(Discipline::ETag, Some(&snap), Some(etag.to_string())),
                directive: CacheDirective::NoCache,
            },
            validator: Validator::ETag(etag),
        }
    }

    /// Revalidates against the resource's modification date.
    ///
    /// The client's copy is current when its date is at or after the
    /// resource's; unparseable dates are a miss.
    #[must_use]
    pub fn get_with_last_modified(&self, client: Option<&str>) -> CacheDecision {
        let snap = self.store.snapshot();
        let current = snap
            .last_modified
            .truncate(self.config.last_modified_granularity);

        if self.unchanged_since(client, current) {
            return CacheDecision::NotModified {
                validator: Validator::LastModified(current),
                directive: CacheDirective::NoCache,
            };
        }

        CacheDecision::Fresh {
            representation: Representation {
                payload: self.payload(
                    Discipline::LastModified,
                    Some(&snap),
                    Some(current.to_http_string()),
                ),
                directive: CacheDirective::NoCache,
            },
            validator: Validator::LastModified(current),
        }
    }

    /// Always-fresh representation reusable for `ttl_seconds`.
    #[must_use]
    pub fn get_with_max_age(&self, ttl_seconds: u64) -> Representation {
        Representation {
            payload: self.payload(Discipline::MaxAge, None, None),
            directive: CacheDirective::MaxAge(ttl_seconds),
        }
    }

    /// Revalidates against a tag derived from the current time bucket.
    ///
    /// The tag rolls over once per granularity period regardless of the
    /// resource, so a client holding it gets `304` until the bucket ends.
    #[must_use]
    pub fn get_with_time_bucket_etag(
        &self,
        client: Option<&str>,
        directive: CacheDirective,
    ) -> CacheDecision {
        let bucket = self.current_bucket();
        let etag = ETag::for_time_bucket(bucket);

        if client.is_some_and(|c| etag.matches(c)) {
            return CacheDecision::NotModified {
                validator: Validator::ETag(etag),
                directive,
            };
        }

        let discipline = match directive {
            CacheDirective::MaxAge(_) => Discipline::MaxAge,
            CacheDirective::NoCache | CacheDirective::NoStore => Discipline::ETag,
        };
        CacheDecision::Fresh {
            representation: Representation {
                payload: self.payload(discipline, None, Some(etag.to_string())),
                directive,
            },
            validator: Validator::ETag(etag),
        }
    }

    /// Revalidates against the start of the current time bucket.
    #[must_use]
    pub fn get_with_time_bucket_last_modified(&self, client: Option<&str>) -> CacheDecision {
        let bucket = self.current_bucket();

        if self.unchanged_since(client, bucket) {
            return CacheDecision::NotModified {
                validator: Validator::LastModified(bucket),
                directive: CacheDirective::NoCache,
            };
        }

        CacheDecision::Fresh {
            representation: Representation {
                payload: self.payload(
                    Discipline::LastModified,
                    None,
                    Some(bucket.to_http_string()),
                ),
                directive: CacheDirective::NoCache,
            },
            validator: Validator::LastModified(bucket),
        }
    }

    /// Replaces the content, bumping the version and modification date.
    ///
    /// Missing or blank content is replaced by an `Updated at ...` placeholder.
    /// The clock is read inside the store's critical section, so versions and
    /// dates are committed in the same order.
    pub fn update(&self, content: Option<String>) -> Arc<VersionedResource> {
        let granularity = self.config.last_modified_granularity;
        let next = self.store.replace_with(|| {
            let now = self.clock.now();
            let content = content
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| format!("Updated at {}", now.to_rfc3339()));
            (content, HttpDate::from(now).truncate(granularity))
        });
        tracing::info!(
            version = next.version,
            last_modified = %next.last_modified,
            "Resource updated"
        );
        next
    }

    fn current_bucket(&self) -> HttpDate {
        HttpDate::from(self.clock.now()).truncate(self.config.last_modified_granularity)
    }

    fn unchanged_since(&self, client: Option<&str>, current: HttpDate) -> bool {
        let Some(raw) = client else {
            return false;
        };
        match HttpDate::parse(raw) {
            Ok(since) => {
                let unchanged = since >= current;
                tracing::debug!(
                    current = %current,
                    client = %since,
                    unchanged,
                    "Compared If-Modified-Since"
                );
                unchanged
            }
            Err(e) => {
                tracing::debug!(
                    header = "if-modified-since",
                    error = %e,
                    "Treating validator as a cache miss"
                );
                false
            }
        }
    }

    fn payload(
        &self,
        discipline: Discipline,
        snap: Option<&VersionedResource>,
        validator: Option<String>,
    ) -> Payload {
        let mut rng = rand::thread_rng();
        let hi = self.config.filler_max_repeats.min(MAX_FILLER_REPEATS);
        let lo = self.config.filler_min_repeats.min(hi);
        let repeats = rng.gen_range(lo..=hi);
        let nonce: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();

        Payload {
            discipline,
            generated_at: self.clock.now(),
            nonce,
            data: FILLER_SENTENCE.repeat(repeats),
            content: snap.map(|s| s.content.clone()),
            version: snap.map(|s| s.version),
            validator,
        }
    }
}
