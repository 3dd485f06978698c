//! In-process cache backend with sliding expiration.
//!
//! Entries keep native values (no serialization). Every successful read
//! resets the entry's countdown; an entry that has not been read for longer
//! than its window is treated as absent. Expired entries are dropped on the
//! next read of their key, and writes sweep the whole map at most once per
//! sliding window, so principals that are never read again do not
//! accumulate. [`LocalCache::purge_expired`] forces a sweep.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use fabryk_core::Result;
use parking_lot::Mutex;

use crate::backend::CacheBackend;

#[derive(Debug, Clone)]
struct LocalEntry {
    permissions: Vec<String>,
    window: Duration,
    last_access: Instant,
}

impl LocalEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_access) > self.window
    }
}

/// Process-local [`CacheBackend`].
///
/// Safe for concurrent use without external synchronization. Invalidation
/// is immediate and visible to every reader in the process.
#[derive(Debug)]
pub struct LocalCache {
    entries: DashMap<String, LocalEntry>,
    sliding_window: Duration,
    last_sweep: Mutex<Instant>,
}

impl LocalCache {
    /// Create a cache whose entries expire after `sliding_window` without a read.
    pub fn new(sliding_window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            sliding_window,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// The default sliding window.
    pub fn sliding_window(&self) -> Duration {
        self.sliding_window
    }

    /// Drop every entry whose window has elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            log::debug!("local cache purged {removed} expired entries");
        }
        removed
    }

    /// Sweep expired entries if a full window has passed since the last sweep.
    ///
    /// Writers that find another sweep in progress skip it.
    fn sweep_if_due(&self, now: Instant) {
        let Some(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last_sweep) < self.sliding_window {
            return;
        }
        *last_sweep = now;
        drop(last_sweep);
        self.purge_expired();
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, key: &str) -> Option<Vec<String>> {
        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.is_expired(now) {
                entry.last_access = now;
                return Some(entry.permissions.clone());
            }
        } else {
            return None;
        }

        // Expired. The guard above is released, so removal cannot deadlock;
        // re-check in case a writer refreshed the entry in between.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(Instant::now()));
        None
    }
}

#[async_trait]
impl CacheBackend for LocalCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.read(key))
    }

    async fn set(&self, key: &str, permissions: &[String], ttl: Option<Duration>) -> Result<()> {
        self.sweep_if_due(Instant::now());
        self.entries.insert(
            key.to_string(),
            LocalEntry {
                permissions: permissions.to_vec(),
                window: ttl.unwrap_or(self.sliding_window),
                last_access: Instant::now(),
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }
}

// ============================================================================
// Tests
// ============================================================================
