//! Cache backend trait.
//!
//! One capability interface, two implementations selected at construction
//! time:
//!
//! - [`LocalCache`](crate::LocalCache): in-process, sliding expiration
//! - [`SharedCache`](crate::SharedCache): external key/value store, serialized payloads
//!
//! Orchestration code only ever sees `Arc<dyn CacheBackend>`.

use std::time::Duration;

use async_trait::async_trait;
use fabryk_core::Result;

/// Cache for materialized permission views.
///
/// Both implementations guarantee that a `get` immediately after a
/// successful `set` with the same key returns the same list, and that a
/// `get` after `invalidate` returns `None` unless another `set` raced in.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a cached permission list.
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Store a permission list under `key`.
    ///
    /// `ttl` overrides the backend's default expiration policy. For the
    /// local backend it replaces the sliding window; for the shared backend
    /// it sets an absolute expiry (`None` persists until invalidated).
    async fn set(&self, key: &str, permissions: &[String], ttl: Option<Duration>) -> Result<()>;

    /// Drop the entry for `key`. Absent keys are not an error.
    async fn invalidate(&self, key: &str) -> Result<()>;

    /// The backend name for diagnostics.
    fn name(&self) -> &str;
}
