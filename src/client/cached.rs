//! Caching, de-duplicating layer over `ApiClient`
//!
//! `CachedClient` owns two maps behind one mutex: the TTL store of response
//! bodies and the in-flight map of pending GETs. The lock is only taken in
//! short synchronous sections and never across an `.await`.
//!
//! A GET for a URL with no fresh entry and no pending request spawns a task
//! that performs the request, then (under the lock) drops the in-flight
//! registration and, on success, writes the cache entry. Every caller for that
//! URL awaits the same shared future, so one network call serves them all and
//! an error reaches every waiter. Dropping the waiters does not cancel the task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ApiClient, ApiError, MutationMethod};
use crate::auth::TokenStore;
use crate::cache::{invalidation_prefix, CacheStore, CachedData};
use crate::config::ClientConfig;

type SharedResponse = Shared<BoxFuture<'static, Result<Arc<Value>, ApiError>>>;

/// Per-call options for `CachedClient::fetch`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Overrides the client's default TTL for the entry this call writes
    pub ttl: Option<Duration>,
    /// Skip the freshness check (in-flight requests are still shared)
    pub force: bool,
}

impl FetchOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            force: false,
        }
    }

    pub fn forced() -> Self {
        Self {
            ttl: None,
            force: true,
        }
    }
}

#[derive(Default)]
struct CacheState {
    store: CacheStore,
    inflight: HashMap<String, SharedResponse>,
}

/// Request cache shared by every consumer of the backend
///
/// Cloning is cheap and yields a handle onto the same cache.
#[derive(Clone)]
pub struct CachedClient {
    api: ApiClient,
    default_ttl: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl CachedClient {
    /// Creates a client with an empty cache
    pub fn new(config: &ClientConfig, tokens: Option<TokenStore>) -> Self {
        Self::with_api(ApiClient::new(config, tokens), config.default_ttl)
    }

    /// Wraps an existing transport
    pub fn with_api(api: ApiClient, default_ttl: Duration) -> Self {
        Self {
            api,
            default_ttl,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// GETs `url` through the cache
    ///
    /// Serves a fresh entry without touching the network unless `force` is
    /// set. Otherwise joins the pending request for `url`, starting one if
    /// none exists.
    ///
    /// Must be called inside a tokio runtime: new requests run on a spawned task.
    pub async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Arc<Value>, ApiError> {
        let pending = {
            let mut state = self.lock();
            if !options.force {
                if let Some(data) = state.store.fresh(url) {
                    debug!(url, "cache hit");
                    return Ok(data);
                }
            }
            match state.inflight.get(url) {
                Some(pending) => {
                    debug!(url, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    let ttl = options.ttl.unwrap_or(self.default_ttl);
                    let pending = self.start_request(url, ttl);
                    state.inflight.insert(url.to_string(), pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Like `fetch`, then deserializes the body into `T`
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<T, ApiError> {
        let data = self.fetch(url, options).await?;
        Ok(T::deserialize(data.as_ref())?)
    }

    /// Returns the cached body for `url` if it has not expired
    pub fn fresh(&self, url: &str) -> Option<Arc<Value>> {
        self.lock().store.fresh(url)
    }

    /// Returns the cached entry for `url`, expired or not
    pub fn cached(&self, url: &str) -> Option<CachedData> {
        self.lock().store.read(url)
    }

    /// Number of GETs currently awaiting a response
    pub fn inflight_count(&self) -> usize {
        self.lock().inflight.len()
    }

    /// Sends a write, then invalidates the cached resource family
    ///
    /// On success every cache entry sharing the first two path segments of
    /// `url` is dropped, e.g. `/api/tools/5` busts everything under
    /// `/api/tools`. A failed write leaves the cache alone.
    pub async fn mutate(
        &self,
        url: &str,
        method: MutationMethod,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let result = self.api.request(method.as_method(), url, body).await?;

        let prefix = invalidation_prefix(url);
        let removed = self.bust_cache(&prefix);
        info!(%method, url, prefix = %prefix, removed, "mutation invalidated cache");

        Ok(result)
    }

    /// Drops every cache entry whose key starts with `prefix`
    ///
    /// Pending requests are not affected.
    pub fn bust_cache(&self, prefix: &str) -> usize {
        let removed = self.lock().store.bust_prefix(prefix);
        debug!(prefix, removed, "busted cache entries");
        removed
    }

    fn start_request(&self, url: &str, ttl: Duration) -> SharedResponse {
        let api = self.api.clone();
        let state = Arc::clone(&self.state);
        let key = url.to_string();

        let task = tokio::spawn(async move {
            let result = api.get(&key).await.map(Arc::new);

            let mut state = lock_state(&state);
            state.inflight.remove(&key);
            match &result {
                Ok(data) => state.store.write(&key, Arc::clone(data), ttl),
                Err(e) => warn!(url = %key, error = %e, "fetch failed"),
            }
            result
        });

        async move {
            task.await
                .map_err(|e| ApiError::Transport(format!("request task failed: {}", e)))?
        }
        .boxed()
        .shared()
    }

    #[cfg(test)]
    pub(crate) fn seed(&self, url: &str, value: Value, ttl: Duration) {
        self.lock().store.write(url, Arc::new(value), ttl);
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    // No code path panics while holding the lock, and both maps stay valid
    // between statements anyway.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
