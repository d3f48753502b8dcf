//! In-memory cache of repository reads.
//!
//! Reads are keyed by commit sha, and content at a sha never changes, so
//! entries are never invalidated.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::store::{ContentStore, Listing};
use crate::Result;

/// `(rev, path)`.
type Key = (String, String);

/// Caches successful directory listings and file reads of a wrapped store.
///
/// Failures are not cached. One cache is shared by all commits of a push;
/// two threads missing on the same key at once may both reach the inner
/// store.
pub struct CachedStore<S> {
    inner: S,
    listings: Mutex<HashMap<Key, Listing>>,
    files: Mutex<HashMap<Key, Vec<u8>>>,
}

impl<S> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        CachedStore {
            inner,
            listings: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Get the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached listings and files.
    pub fn len(&self) -> usize {
        lock(&self.listings).len() + lock(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // The maps stay consistent even if a holder panicked.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: ContentStore> ContentStore for CachedStore<S> {
    fn file_content(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        let key = (rev.to_string(), path.to_string());
        if let Some(content) = lock(&self.files).get(&key) {
            trace!(rev, path, "file cache hit");
            return Ok(content.clone());
        }

        let content = self.inner.file_content(rev, path)?;
        lock(&self.files).insert(key, content.clone());
        Ok(content)
    }

    fn list_directory(&self, rev: &str, dir: &str) -> Result<Listing> {
        let key = (rev.to_string(), dir.to_string());
        if let Some(listing) = lock(&self.listings).get(&key) {
            trace!(rev, dir, "listing cache hit");
            return Ok(listing.clone());
        }

        let listing = self.inner.list_directory(rev, dir)?;
        lock(&self.listings).insert(key, listing.clone());
        Ok(listing)
    }
}
