//! Workspace portal API client
//!
//! A caching REST client for the workspace portal backend: TTL cache keyed by
//! URL, in-flight request de-duplication, and prefix invalidation after writes.
//! The `wsapi` binary and the integration tests use these modules.

pub mod auth;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod query;
pub mod refresh;
