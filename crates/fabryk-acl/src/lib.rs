//! Access control layer for Fabryk.
//!
//! Answers "does principal P hold permission X?" by combining a
//! permission store with a cache-aside layer over one of two
//! interchangeable cache backends, plus an authorization step that maps a
//! credential set to an allow/deny decision.
//!
//! # Features
//!
//! - `acl-redis`: Enable the Redis transport for the shared cache backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      fabryk-acl                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AuthorizationEvaluator                                     │
//! │  └── CredentialSet → Allow / Unauthenticated / Forbidden    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PermissionCacheService (cache-aside, invalidate on write)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PermissionStore trait                                      │
//! │  └── InMemoryPermissionStore                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CacheBackend trait                                         │
//! │  ├── LocalCache (in-process, sliding expiration)            │
//! │  └── SharedCache (serialized payloads over KeyValueClient)  │
//! │      ├── MemoryKeyValueClient (always available)            │
//! │      ├── RetryingKeyValueClient (backoff wrapper)           │
//! │      └── RedisClient (feature: acl-redis)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fabryk_acl::{
//!     AclConfig, AuthorizationDecision, AuthorizationEvaluator, CredentialSet,
//!     InMemoryPermissionStore,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryPermissionStore::new());
//! let evaluator = AuthorizationEvaluator::from_config(store, &AclConfig::default()).await?;
//!
//! evaluator.service().add_permission_to_user("alice", "Invoice.View").await?;
//!
//! let credentials = CredentialSet::authenticated().with_attribute("name", "alice");
//! let decision = evaluator.evaluate(&credentials, "Invoice.View").await?;
//! assert_eq!(decision, AuthorizationDecision::Allow);
//! ```

#![doc = include_str!("../README.md")]

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub mod evaluator;
pub mod local;
pub mod retry;
pub mod service;
pub mod shared;
pub mod store;
pub mod types;

// Feature-gated transport modules
#[cfg(feature = "acl-redis")]
pub mod redis_cache;

// Re-exports: core types
pub use config::{AclConfig, CacheBackendKind};
pub use evaluator::{AuthorizationDecision, CredentialSet, extract_principal_id};
pub use types::{CACHE_KEY_PREFIX, cache_key, effective_permissions};

// Re-exports: traits and implementations
pub use backend::CacheBackend;
pub use local::LocalCache;
pub use retry::RetryingKeyValueClient;
pub use shared::{KeyValueClient, MemoryKeyValueClient, SharedCache};
pub use store::{InMemoryPermissionStore, PermissionStore};

// Re-exports: orchestration
pub use evaluator::AuthorizationEvaluator;
pub use service::PermissionCacheService;

// Re-exports: factory
pub use config::create_cache_backend;

// Feature-gated re-exports
#[cfg(feature = "acl-redis")]
pub use redis_cache::RedisClient;
