//! Access-control configuration and backend construction.
//!
//! [`AclConfig`] is validated once, at setup. A bad configuration fails
//! there and never at request time.
//!
//! Numeric options also accept their decimal text (`"60"`), since
//! environment overlays deliver every value as a string.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use fabryk_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::backend::CacheBackend;
use crate::local::LocalCache;

// ============================================================================
// Configuration
// ============================================================================

/// Which cache backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process cache with sliding expiration.
    #[default]
    Local,
    /// External key/value cache shared between processes.
    Shared,
}

impl std::fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Shared => f.write_str("shared"),
        }
    }
}

/// Access-control configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclConfig {
    /// Cache backend: "local" or "shared".
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// Credential attribute that carries the principal id.
    #[serde(default = "default_identifier_attribute")]
    pub identifier_attribute: String,

    /// Shared cache endpoint (required when `backend = "shared"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_cache_endpoint: Option<String>,

    /// Sliding expiration window for the local cache, in seconds.
    #[serde(
        default = "default_cache_staleness_secs",
        deserialize_with = "number_or_text"
    )]
    pub cache_staleness_secs: u64,

    /// Absolute TTL for shared cache entries, in seconds. Unset means no expiry.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_number_or_text"
    )]
    pub shared_cache_ttl_secs: Option<u64>,

    /// Transport-level retries for shared cache calls.
    #[serde(default, deserialize_with = "number_or_text")]
    pub shared_cache_retries: u32,
}

fn default_identifier_attribute() -> String {
    "name".to_string()
}

fn default_cache_staleness_secs() -> u64 {
    300
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

fn parse_number<T, E>(text: &str) -> std::result::Result<T, E>
where
    T: FromStr,
    T::Err: Display,
    E: serde::de::Error,
{
    text.trim()
        .parse()
        .map_err(|e| E::custom(format!("invalid number {text:?}: {e}")))
}

fn number_or_text<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrText::<T>::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => parse_number(&text),
    }
}

fn optional_number_or_text<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => parse_number(&text).map(Some),
    }
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            identifier_attribute: default_identifier_attribute(),
            shared_cache_endpoint: None,
            cache_staleness_secs: default_cache_staleness_secs(),
            shared_cache_ttl_secs: None,
            shared_cache_retries: 0,
        }
    }
}

impl AclConfig {
    /// Configuration for the shared backend at `endpoint`.
    pub fn shared(endpoint: impl Into<String>) -> Self {
        Self {
            backend: CacheBackendKind::Shared,
            shared_cache_endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Sliding window for the local backend.
    pub fn cache_staleness(&self) -> Duration {
        Duration::from_secs(self.cache_staleness_secs)
    }

    /// Absolute TTL for shared entries, if any.
    pub fn shared_cache_ttl(&self) -> Option<Duration> {
        self.shared_cache_ttl_secs.map(Duration::from_secs)
    }

    /// Check the configuration for errors that must stop startup.
    pub fn validate(&self) -> Result<()> {
        if self.identifier_attribute.trim().is_empty() {
            return Err(Error::config("identifier_attribute must not be empty"));
        }
        if self.cache_staleness_secs == 0 {
            return Err(Error::config("cache_staleness_secs must be greater than zero"));
        }
        if self.backend == CacheBackendKind::Shared {
            let endpoint = self.shared_cache_endpoint.as_deref().unwrap_or_default();
            if endpoint.trim().is_empty() {
                return Err(Error::config(
                    "shared_cache_endpoint is required when backend = \"shared\"",
                ));
            }
        }
        if self.shared_cache_ttl_secs == Some(0) {
            return Err(Error::config("shared_cache_ttl_secs must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Construct the configured cache backend.
///
/// Validates the configuration first. For the shared backend this connects
/// to the endpoint, so connection failures also surface here.
pub async fn create_cache_backend(config: &AclConfig) -> Result<Arc<dyn CacheBackend>> {
    config.validate()?;

    match config.backend {
        CacheBackendKind::Local => {
            log::info!(
                "using local permission cache (sliding window {:?})",
                config.cache_staleness()
            );
            Ok(Arc::new(LocalCache::new(config.cache_staleness())))
        }
        CacheBackendKind::Shared => create_shared_backend(config).await,
    }
}

#[cfg(feature = "acl-redis")]
async fn create_shared_backend(config: &AclConfig) -> Result<Arc<dyn CacheBackend>> {
    use crate::redis_cache::RedisClient;
    use crate::retry::RetryingKeyValueClient;
    use crate::shared::{KeyValueClient, SharedCache};

    let endpoint = config.shared_cache_endpoint.as_deref().unwrap_or_default();
    let mut client: Arc<dyn KeyValueClient> = Arc::new(RedisClient::connect(endpoint).await?);
    if config.shared_cache_retries > 0 {
        client = Arc::new(
            RetryingKeyValueClient::new(client).with_max_attempts(config.shared_cache_retries),
        );
    }

    log::info!("using shared permission cache at {endpoint}");
    Ok(Arc::new(
        SharedCache::new(client).with_default_ttl(config.shared_cache_ttl()),
    ))
}

#[cfg(not(feature = "acl-redis"))]
async fn create_shared_backend(_config: &AclConfig) -> Result<Arc<dyn CacheBackend>> {
    Err(Error::config(
        "the shared cache backend requires the `acl-redis` feature",
    ))
}

// ============================================================================
// Tests
// ============================================================================
