//! Cache-aside orchestration over a [`PermissionStore`].
//!
//! Reads check the cache first and populate it on a miss with the union of
//! the principal's grants and the global grants. Writes go to the store and
//! then invalidate the principal's entry. The cached value mixes
//! per-principal and global state, so it is never patched in place.
//!
//! # Consistency
//!
//! - A per-principal mutation is visible to every read that starts after its
//!   invalidation completes.
//! - A read racing a mutation may repopulate the entry with the pre-write
//!   view. That entry lives until the next write to the principal or until
//!   the backend expires it.
//! - Global mutations do not invalidate any cached entry. Cached views pick
//!   up global changes once they expire (local sliding window, or the shared
//!   TTL when one is configured) or when the principal is next written.

use std::sync::Arc;
use std::time::Duration;

use fabryk_core::Result;

use crate::backend::CacheBackend;
use crate::config::{AclConfig, create_cache_backend};
use crate::store::PermissionStore;
use crate::types::{cache_key, effective_permissions};

/// Permission query and mutation surface backed by one cache backend.
#[derive(Clone)]
pub struct PermissionCacheService {
    store: Arc<dyn PermissionStore>,
    cache: Arc<dyn CacheBackend>,
    entry_ttl: Option<Duration>,
}

impl PermissionCacheService {
    /// Create a service over `store` using `cache`.
    pub fn new(store: Arc<dyn PermissionStore>, cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            store,
            cache,
            entry_ttl: None,
        }
    }

    /// Build the service with the backend selected by `config`.
    pub async fn from_config(store: Arc<dyn PermissionStore>, config: &AclConfig) -> Result<Self> {
        let cache = create_cache_backend(config).await?;
        Ok(Self::new(store, cache))
    }

    /// Pass an explicit TTL with every cache write instead of the backend default.
    pub fn with_entry_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.entry_ttl = ttl;
        self
    }

    /// The active cache backend.
    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn PermissionStore> {
        &self.store
    }

    /// Whether `principal` holds `permission`, directly or globally.
    pub async fn has_permission(&self, principal: &str, permission: &str) -> Result<bool> {
        let permissions = self.get_user_permissions(principal).await?;
        Ok(permissions.iter().any(|p| p == permission))
    }

    /// Effective permissions of `principal`: its own grants plus the global grants.
    pub async fn get_user_permissions(&self, principal: &str) -> Result<Vec<String>> {
        let key = cache_key(principal);

        if let Some(cached) = self.cache.get(&key).await? {
            log::debug!("permission cache hit for {key}");
            return Ok(cached);
        }

        log::debug!("permission cache miss for {key}");
        let user = self.store.get_permissions_for_user(principal);
        let global = self.store.global_permissions();
        let permissions = effective_permissions(&user, &global);

        self.cache.set(&key, &permissions, self.entry_ttl).await?;
        Ok(permissions)
    }

    /// Grant `permission` to `principal` and invalidate its cached view.
    pub async fn add_permission_to_user(&self, principal: &str, permission: &str) -> Result<()> {
        self.store.add_permission_to_user(principal, permission);
        self.invalidate(principal).await
    }

    /// Revoke `permission` from `principal` and invalidate its cached view.
    pub async fn remove_permission_from_user(
        &self,
        principal: &str,
        permission: &str,
    ) -> Result<()> {
        self.store.remove_permission_from_user(principal, permission);
        self.invalidate(principal).await
    }

    /// Grant `permission` globally. Cached views are left to expire.
    pub async fn add_global_permission(&self, permission: &str) {
        self.store.add_global_permission(permission);
    }

    /// Revoke a global grant. Cached views are left to expire.
    pub async fn remove_global_permission(&self, permission: &str) {
        self.store.remove_global_permission(permission);
    }

    /// The global permission set, read straight from the store.
    pub async fn get_all_permissions(&self) -> Vec<String> {
        self.store.get_all_permissions()
    }

    async fn invalidate(&self, principal: &str) -> Result<()> {
        let key = cache_key(principal);
        self.cache.invalidate(&key).await?;
        log::debug!("invalidated permission cache entry {key}");
        Ok(())
    }
}

impl std::fmt::Debug for PermissionCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCacheService")
            .field("cache", &self.cache.name())
            .field("entry_ttl", &self.entry_ttl)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
