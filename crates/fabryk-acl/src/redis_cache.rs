//! Redis transport for the shared cache.
//!
//! Uses a [`ConnectionManager`], which reconnects transparently and is
//! cheap to clone per call. No timeout is imposed here; that policy belongs
//! to the connection configuration.
//!
//! # Feature Gate
//!
//! This module requires the `acl-redis` feature.

use std::time::Duration;

use async_trait::async_trait;
use fabryk_core::{Error, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::shared::KeyValueClient;

/// Redis-backed [`KeyValueClient`].
#[derive(Clone)]
pub struct RedisClient {
    connection: ConnectionManager,
    endpoint: String,
}

impl RedisClient {
    /// Connect to the Redis server at `endpoint` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let client = redis::Client::open(endpoint)
            .map_err(|e| Error::config(format!("invalid shared cache endpoint {endpoint}: {e}")))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::cache(format!("failed to connect to {endpoint}: {e}")))?;

        log::info!("connected to shared cache at {endpoint}");
        Ok(Self {
            connection,
            endpoint: endpoint.to_string(),
        })
    }

    /// The endpoint this client was created with.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl KeyValueClient for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| Error::cache(format!("GET {key}: {e}")))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection.clone();
        let result = match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, expiry_secs(ttl)).await,
            None => conn.set::<_, _, ()>(key, value).await,
        };
        result.map_err(|e| Error::cache(format!("SET {key}: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::cache(format!("DEL {key}: {e}")))
    }

    fn name(&self) -> &str {
        "redis"
    }
}

/// Whole seconds for `SET EX`, rounded up: entries live at least as long as
/// requested, and a sub-second TTL never turns into "no expiry".
fn expiry_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
