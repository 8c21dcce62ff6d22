//! In-memory TTL store for backend responses
//!
//! Provides a `CacheStore` keyed by request URL. Entries carry an expiry
//! instant and are only considered fresh before it; stale entries stay in
//! the map until they are overwritten or busted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::Instant;

/// A single cached response body
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The parsed response body
    data: Arc<Value>,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires; `None` never expires
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// Result of reading from the store, including metadata about freshness
#[derive(Debug, Clone)]
pub struct CachedData {
    /// The cached response body
    pub data: Arc<Value>,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the cache entry has expired
    pub is_expired: bool,
}

/// TTL map of response bodies keyed by request URL
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `key`, replacing any previous entry
    ///
    /// The entry is fresh until `ttl` has elapsed from now. A TTL too large
    /// to represent as an instant (e.g. `Duration::MAX`) never expires.
    pub fn write(&mut self, key: &str, data: Arc<Value>, ttl: Duration) {
        let entry = CacheEntry {
            data,
            cached_at: Utc::now(),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Reads an entry whether or not it has expired
    ///
    /// Returns `None` if nothing was ever stored under `key` (or it was busted).
    pub fn read(&self, key: &str) -> Option<CachedData> {
        let entry = self.entries.get(key)?;
        Some(CachedData {
            data: Arc::clone(&entry.data),
            cached_at: entry.cached_at,
            is_expired: !entry.is_fresh(Instant::now()),
        })
    }

    /// Returns the cached body only while `expires_at > now`
    pub fn fresh(&self, key: &str) -> Option<Arc<Value>> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| Arc::clone(&entry.data))
    }

    /// Drops every entry whose key starts with `prefix`
    ///
    /// Returns the number of entries removed.
    pub fn bust_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes the prefix a mutation of `url` invalidates
///
/// Keeps the first two path segments, so `/api/tools/5` yields `/api/tools`.
/// Query string and fragment are ignored.
pub fn invalidation_prefix(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/').take(3).collect::<Vec<_>>().join("/")
}
