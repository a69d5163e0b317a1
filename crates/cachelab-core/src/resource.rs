//! The versioned resource and its snapshot store.

use crate::{ETag, HttpDate};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// An immutable snapshot of the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedResource {
    /// The payload text.
    pub content: String,
    /// Incremented on every update.
    pub version: u64,
    /// Modification time, already truncated to the store's granularity.
    pub last_modified: HttpDate,
}

impl VersionedResource {
    /// Returns the entity tag for this snapshot.
    #[must_use]
    pub fn etag(&self) -> ETag {
        ETag::for_version(&self.content, self.version)
    }
}

/// Holds the current snapshot.
///
/// Readers clone an `Arc` to the whole snapshot; writers replace it under the
/// write lock. Content, version, and date therefore move as one unit.
#[derive(Debug)]
pub struct ResourceStore {
    current: RwLock<Arc<VersionedResource>>,
}

impl ResourceStore {
    /// Creates a store holding version 1 of `content`.
    #[must_use]
    pub fn new(content: impl Into<String>, last_modified: HttpDate) -> Self {
        Self {
            current: RwLock::new(Arc::new(VersionedResource {
                content: content.into(),
                version: 1,
                last_modified,
            })),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<VersionedResource> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the content and bumps the version in one step.
    pub fn replace(&self, content: String, last_modified: HttpDate) -> Arc<VersionedResource> {
        self.replace_with(|| (content, last_modified))
    }

    /// Like [`ResourceStore::replace`], computing the new content and date
    /// while the write lock is held.
    ///
    /// `last_modified` never moves backwards: a date earlier than the
    /// current one is raised to it, so a later version always carries a date
    /// at or after every date handed out before it.
    pub fn replace_with<F>(&self, next: F) -> Arc<VersionedResource>
    where
        F: FnOnce() -> (String, HttpDate),
    {
        let mut current = self.current.write();
        let (content, last_modified) = next();
        let next = Arc::new(VersionedResource {
            content,
            version: current.version.saturating_add(1),
            last_modified: last_modified.max(current.last_modified),
        });
        *current = Arc::clone(&next);
        next
    }
}
