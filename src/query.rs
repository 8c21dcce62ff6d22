//! Subscription handle over a cached GET
//!
//! A `Query` tracks one URL and publishes `{data, loading, error}` snapshots
//! through a `tokio::sync::watch` channel. Loads go through `CachedClient`, so
//! many queries on the same URL share cache entries and in-flight requests.
//!
//! Disposing the handle (explicitly or by dropping it) stops delivery only:
//! a load that is already running still completes and still fills the cache.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::client::{ApiError, CachedClient, FetchOptions};

/// Snapshot published to subscribers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Last successfully loaded body
    pub data: Option<Arc<Value>>,
    /// Whether a load is in progress
    pub loading: bool,
    /// Message of the last failed load; cleared by the next success
    pub error: Option<String>,
}

/// Options fixed for the lifetime of a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// TTL for entries this query writes; the client's default otherwise
    pub ttl: Option<Duration>,
    /// A disabled query never loads and never reports `loading`
    pub disabled: bool,
}

struct QueryShared {
    client: CachedClient,
    options: QueryOptions,
    url: Mutex<String>,
    state: watch::Sender<QueryState>,
    disposed: AtomicBool,
    /// Bumped on every URL change so results for an old URL are discarded
    generation: AtomicU64,
}

impl QueryShared {
    fn url(&self) -> String {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.disposed.load(Ordering::Acquire) && self.generation.load(Ordering::Acquire) == generation
    }

    fn publish(&self, generation: u64, url: &str, result: Result<Arc<Value>, ApiError>) {
        if !self.is_current(generation) {
            debug!(url, "dropping result for disposed or superseded query");
            return;
        }
        self.state.send_modify(|state| {
            state.loading = false;
            match result {
                Ok(data) => {
                    state.data = Some(data);
                    state.error = None;
                }
                Err(e) => state.error = Some(e.to_string()),
            }
        });
    }
}

/// Pending network load prepared by `Query::begin`
struct PendingLoad {
    generation: u64,
    url: String,
    options: FetchOptions,
}

/// Live view of one backend resource
///
/// Must be created inside a tokio runtime: construction starts the first load.
pub struct Query {
    shared: Arc<QueryShared>,
}

impl Query {
    /// Creates the query and starts loading `url` unless disabled
    ///
    /// A fresh cache entry is published before this returns.
    pub fn new(client: CachedClient, url: impl Into<String>, options: QueryOptions) -> Self {
        let (state, _) = watch::channel(QueryState {
            loading: !options.disabled,
            ..QueryState::default()
        });
        let query = Self {
            shared: Arc::new(QueryShared {
                client,
                options,
                url: Mutex::new(url.into()),
                state,
                disposed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        };
        query.spawn_load(false);
        query
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.shared.state.subscribe()
    }

    /// Current snapshot
    pub fn state(&self) -> QueryState {
        self.shared.state.borrow().clone()
    }

    pub fn url(&self) -> String {
        self.shared.url()
    }

    pub fn options(&self) -> QueryOptions {
        self.shared.options
    }

    /// Reloads in the background, bypassing the freshness check
    pub fn refetch(&self) {
        self.spawn_load(true);
    }

    /// Forces a reload and waits for it, returning the resulting snapshot
    pub async fn refresh(&self) -> QueryState {
        if let Some(pending) = self.begin(true) {
            let result = self.shared.client.fetch(&pending.url, pending.options).await;
            self.shared.publish(pending.generation, &pending.url, result);
        }
        self.state()
    }

    /// Points the query at a new URL and loads it
    ///
    /// Loads still running for the previous URL will not publish.
    pub fn set_url(&self, url: impl Into<String>) {
        *self.shared.url.lock().unwrap_or_else(PoisonError::into_inner) = url.into();
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.spawn_load(false);
    }

    /// Stops publishing; pending loads run to completion silently
    pub fn dispose(&self) {
        self.shared.disposed.store(true, Ordering::Release);
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    fn spawn_load(&self, force: bool) {
        let Some(pending) = self.begin(force) else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let result = shared.client.fetch(&pending.url, pending.options).await;
            shared.publish(pending.generation, &pending.url, result);
        });
    }

    /// Handles everything that happens before the network
    ///
    /// Returns `None` when the query is disabled or disposed, or when a fresh
    /// cache entry was published synchronously.
    fn begin(&self, force: bool) -> Option<PendingLoad> {
        let shared = &self.shared;
        if shared.options.disabled || self.is_disposed() {
            return None;
        }

        let generation = shared.generation.load(Ordering::Acquire);
        let url = shared.url();
        if !force {
            if let Some(data) = shared.client.fresh(&url) {
                shared.publish(generation, &url, Ok(data));
                return None;
            }
        }

        shared.state.send_modify(|state| state.loading = true);
        Some(PendingLoad {
            generation,
            url,
            options: FetchOptions {
                ttl: shared.options.ttl,
                force,
            },
        })
    }
}

impl Drop for Query {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;

    fn offline_client() -> CachedClient {
        CachedClient::new(&ClientConfig::new("http://127.0.0.1:9"), None)
    }

    #[tokio::test]
    async fn test_disabled_query_stays_idle() {
        let query = Query::new(
            offline_client(),
            "/api/tools",
            QueryOptions {
                disabled: true,
                ..Default::default()
            },
        );

        assert_eq!(query.state(), QueryState::default());
        query.refetch();
        assert_eq!(query.refresh().await, QueryState::default());
    }

    #[tokio::test]
    async fn test_fresh_cache_published_synchronously() {
        let client = offline_client();
        client.seed("/api/team", json!([{"name": "Ada"}]), Duration::from_secs(60));

        let query = Query::new(client, "/api/team", QueryOptions::default());

        let state = query.state();
        assert!(!state.loading);
        assert_eq!(state.data.as_deref(), Some(&json!([{"name": "Ada"}])));
    }

    #[tokio::test]
    async fn test_disposed_query_ignores_refetch() {
        let query = Query::new(
            offline_client(),
            "/api/tasks",
            QueryOptions {
                disabled: true,
                ..Default::default()
            },
        );
        query.dispose();

        assert!(query.is_disposed());
        assert!(query.begin(true).is_none());
    }
}
