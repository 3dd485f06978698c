//! Common types for the access-control engine.
//!
//! Principals and permissions are opaque strings. Permissions are compared
//! by exact, case-sensitive equality; no structure is imposed on them.

use std::collections::{BTreeSet, HashSet};

/// Prefix for every cache key written by the engine.
pub const CACHE_KEY_PREFIX: &str = "permissions:";

/// Deterministic cache key for a principal's materialized permissions.
pub fn cache_key(principal: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{principal}")
}

/// Materialize the effective permission view for one principal.
///
/// The result is the union of the principal's own grants and the global
/// grants, deduplicated and sorted so that equal views serialize identically.
pub fn effective_permissions(user: &HashSet<String>, global: &HashSet<String>) -> Vec<String> {
    user.iter()
        .chain(global.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
