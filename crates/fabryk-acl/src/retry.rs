//! Retry wrapper for shared cache transports.
//!
//! Retries belong to the transport, never to the cache-aside logic, so this
//! wraps a [`KeyValueClient`] rather than a [`CacheBackend`](crate::CacheBackend).

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;

use crate::shared::KeyValueClient;
use fabryk_core::{Error, Result};

/// Wraps a key/value transport with exponential-backoff retries.
pub struct RetryingKeyValueClient {
    inner: Arc<dyn KeyValueClient>,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryingKeyValueClient {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max retries: 3
    /// - Initial delay: 50 milliseconds
    /// - Max delay: 1 second
    pub fn new(client: Arc<dyn KeyValueClient>) -> Self {
        Self {
            inner: client,
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }

    /// Sets the maximum number of retries after the first attempt.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts as usize)
    }

    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }

    fn log_retry(error: &Error, delay: Duration) {
        log::warn!("shared cache call failed, retrying in {delay:?}: {error}");
    }
}

#[async_trait]
impl KeyValueClient for RetryingKeyValueClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let client = self.inner.clone();
        (|| async { client.get(key).await })
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(Self::log_retry)
            .await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let client = self.inner.clone();
        (|| async { client.set(key, value.clone(), ttl).await })
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(Self::log_retry)
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let client = self.inner.clone();
        (|| async { client.delete(key).await })
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(Self::log_retry)
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::MemoryKeyValueClient;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with the given error kind, then delegates.
    struct FlakyClient {
        inner: MemoryKeyValueClient,
        failures: u32,
        retryable: bool,
        calls: AtomicU32,
    }

    impl FlakyClient {
        fn new(failures: u32, retryable: bool) -> Self {
            Self {
                inner: MemoryKeyValueClient::new(),
                failures,
                retryable,
                calls: AtomicU32::new(0),
            }
        }

        fn check(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if self.retryable {
                    return Err(Error::cache("connection reset"));
                }
                return Err(Error::serialization("bad payload"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KeyValueClient for FlakyClient {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.check()?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
            self.check()?;
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.check()?;
            self.inner.delete(key).await
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn fast(client: Arc<dyn KeyValueClient>) -> RetryingKeyValueClient {
        RetryingKeyValueClient::new(client)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let flaky = Arc::new(FlakyClient::new(2, true));
        let client = fast(flaky.clone());

        client.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let flaky = Arc::new(FlakyClient::new(10, true));
        let client = fast(flaky.clone()).with_max_attempts(2);

        let err = client.delete("k").await.unwrap_err();
        assert!(matches!(err, Error::Cache(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let flaky = Arc::new(FlakyClient::new(1, false));
        let client = fast(flaky.clone());

        let err = client.get("k").await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_wrapper_builder() {
        let client = RetryingKeyValueClient::new(Arc::new(MemoryKeyValueClient::new()))
            .with_max_attempts(5)
            .with_initial_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(30));

        assert_eq!(client.max_attempts, 5);
        assert_eq!(client.initial_delay, Duration::from_millis(500));
        assert_eq!(client.max_delay, Duration::from_secs(30));
        assert_eq!(client.name(), "memory");
    }
}
