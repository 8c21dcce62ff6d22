//! Cache module for storing backend responses in memory
//!
//! This module provides the TTL store used by the cached client. Entries are
//! keyed by request URL and expire after a per-write TTL; expired entries are
//! kept (and reported with `is_expired`) until overwritten or busted by prefix.

mod store;

pub use store::{invalidation_prefix, CacheStore, CachedData};
