//! Backend client
//!
//! `ApiClient` is the plain REST transport. `CachedClient` layers the TTL
//! cache, in-flight de-duplication, and post-mutation invalidation on top.

mod cached;
mod error;
mod http;

pub use cached::{CachedClient, FetchOptions};
pub use error::ApiError;
pub use http::{ApiClient, MutationMethod};
