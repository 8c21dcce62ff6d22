//! Client configuration
//!
//! Holds the backend location and the default cache TTL. The binary fills it
//! from CLI flags and `WORKSPACE_BACKEND_URL`; library users build it directly.

use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// TTL applied to cached GETs when the caller gives none
pub const DEFAULT_TTL: Duration = Duration::from_millis(30_000);

/// Settings shared by the transport and the cache layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and optional base path; request paths are appended verbatim
    pub backend_url: String,
    /// TTL for cached responses when a fetch does not override it
    pub default_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

impl ClientConfig {
    /// Creates a config for `backend_url`; a trailing slash is dropped
    pub fn new(backend_url: impl Into<String>) -> Self {
        let backend_url: String = backend_url.into();
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}
