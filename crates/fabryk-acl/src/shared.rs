//! Shared (out-of-process) cache backend.
//!
//! [`SharedCache`] owns the payload encoding: permission lists are written
//! as JSON arrays of strings and decoded on read. The wire transport sits
//! behind [`KeyValueClient`] so the same encoding runs over Redis in
//! production and over [`MemoryKeyValueClient`] in tests.
//!
//! There is no sliding expiration here. An entry written without a TTL
//! persists until it is explicitly invalidated. Every call may fail and
//! failures propagate unchanged; a payload that cannot be decoded is an
//! error, not a miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fabryk_core::{Error, Result};
use parking_lot::Mutex;

use crate::backend::CacheBackend;

/// Minimal string key/value transport for the shared cache.
///
/// Implementations must make each call atomic from the caller's point of
/// view: a `set` that is cancelled or fails never leaves a partial value
/// visible to readers.
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    /// Fetch the raw value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// Delete `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// The transport name for diagnostics.
    fn name(&self) -> &str;
}

/// A [`CacheBackend`] over an external key/value store.
#[derive(Clone)]
pub struct SharedCache {
    client: Arc<dyn KeyValueClient>,
    default_ttl: Option<Duration>,
}

impl SharedCache {
    /// Create a shared cache over the given transport.
    pub fn new(client: Arc<dyn KeyValueClient>) -> Self {
        Self {
            client,
            default_ttl: None,
        }
    }

    /// Apply an absolute TTL to entries written without an explicit one.
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// The underlying transport.
    pub fn client(&self) -> &Arc<dyn KeyValueClient> {
        &self.client
    }
}

/// Encode a permission list for the wire.
pub fn encode_permissions(permissions: &[String]) -> Result<String> {
    serde_json::to_string(permissions)
        .map_err(|e| Error::serialization(format!("encode permissions: {e}")))
}

/// Decode a permission list read from the wire.
pub fn decode_permissions(payload: &str) -> Result<Vec<String>> {
    serde_json::from_str(payload)
        .map_err(|e| Error::serialization(format!("decode permissions: {e}")))
}

#[async_trait]
impl CacheBackend for SharedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.client.get(key).await? {
            Some(payload) => Ok(Some(decode_permissions(&payload)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, permissions: &[String], ttl: Option<Duration>) -> Result<()> {
        let payload = encode_permissions(permissions)?;
        self.client
            .set(key, payload, ttl.or(self.default_ttl))
            .await
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.client.delete(key).await
    }

    fn name(&self) -> &str {
        "shared"
    }
}

impl std::fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("client", &self.client.name())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

// ============================================================================
// In-memory transport
// ============================================================================

/// In-memory [`KeyValueClient`].
///
/// Stores only serialized strings, so it exercises the same encode/decode
/// path as a networked store. Honors absolute TTLs.
#[derive(Debug, Default)]
pub struct MemoryKeyValueClient {
    values: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryKeyValueClient {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the raw stored payload, bypassing expiry. Test helper.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).map(|(value, _)| value.clone())
    }

    /// Overwrite the raw payload under `key`. Test helper.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.values
            .lock()
            .insert(key.to_string(), (value.into(), None));
    }
}

#[async_trait]
impl KeyValueClient for MemoryKeyValueClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut values = self.values.lock();
        let expired = match values.get(key) {
            Some((_, Some(deadline))) => Instant::now() >= *deadline,
            Some((_, None)) => false,
            None => return Ok(None),
        };
        if expired {
            values.remove(key);
            return Ok(None);
        }
        Ok(values.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        self.values.lock().insert(key.to_string(), (value, deadline));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Tests
// ============================================================================
