//! Permission store: the durable source of truth for grants.
//!
//! [`PermissionStore`] is the seam where durable storage plugs in. The
//! default [`InMemoryPermissionStore`] keeps everything in process memory and
//! does not survive restarts.
//!
//! # Locking
//!
//! Per-principal sets live in a sharded [`DashMap`], so principals in
//! different shards never contend and mutations of one principal's set are
//! mutually exclusive. The global set sits behind its own [`RwLock`],
//! independent of the per-principal map.

use std::collections::HashSet;

use dashmap::DashMap;
use parking_lot::RwLock;

/// Exact-equality set storage for per-principal and global permissions.
///
/// Every operation succeeds unconditionally. Unknown principals read as an
/// empty set; removing something that is not there is a no-op. Returned
/// collections are snapshots owned by the caller.
pub trait PermissionStore: Send + Sync {
    /// Grant `permission` to `principal`. Idempotent.
    fn add_permission_to_user(&self, principal: &str, permission: &str);

    /// Revoke `permission` from `principal` if present.
    fn remove_permission_from_user(&self, principal: &str, permission: &str);

    /// Snapshot of the permissions granted directly to `principal`.
    fn get_permissions_for_user(&self, principal: &str) -> HashSet<String>;

    /// Grant `permission` to every principal. Idempotent.
    fn add_global_permission(&self, permission: &str);

    /// Revoke a global grant if present.
    fn remove_global_permission(&self, permission: &str);

    /// Snapshot of the global set. Ordering is unspecified.
    fn get_all_permissions(&self) -> Vec<String>;

    /// Snapshot of the global set as a set.
    fn global_permissions(&self) -> HashSet<String> {
        self.get_all_permissions().into_iter().collect()
    }
}

/// In-memory [`PermissionStore`].
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    users: DashMap<String, HashSet<String>>,
    global: RwLock<HashSet<String>>,
}

impl InMemoryPermissionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load initial grants.
    pub fn seed<G, U, P>(&self, global: G, users: U)
    where
        G: IntoIterator<Item = String>,
        U: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = String>,
    {
        self.global.write().extend(global);
        for (principal, permissions) in users {
            self.users.entry(principal).or_default().extend(permissions);
        }
    }

    /// Number of principals that have ever been granted something.
    pub fn principal_count(&self) -> usize {
        self.users.len()
    }
}

impl PermissionStore for InMemoryPermissionStore {
    fn add_permission_to_user(&self, principal: &str, permission: &str) {
        self.users
            .entry(principal.to_string())
            .or_default()
            .insert(permission.to_string());
    }

    fn remove_permission_from_user(&self, principal: &str, permission: &str) {
        if let Some(mut set) = self.users.get_mut(principal) {
            set.remove(permission);
        }
    }

    fn get_permissions_for_user(&self, principal: &str) -> HashSet<String> {
        self.users
            .get(principal)
            .map(|set| set.value().clone())
            .unwrap_or_default()
    }

    fn add_global_permission(&self, permission: &str) {
        self.global.write().insert(permission.to_string());
    }

    fn remove_global_permission(&self, permission: &str) {
        self.global.write().remove(permission);
    }

    fn get_all_permissions(&self) -> Vec<String> {
        self.global.read().iter().cloned().collect()
    }

    fn global_permissions(&self) -> HashSet<String> {
        self.global.read().clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_and_get() {
        let store = InMemoryPermissionStore::new();
        store.add_permission_to_user("alice", "Invoice.View");

        let perms = store.get_permissions_for_user("alice");
        assert_eq!(perms.len(), 1);
        assert!(perms.contains("Invoice.View"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = InMemoryPermissionStore::new();
        store.add_permission_to_user("alice", "Invoice.View");
        store.add_permission_to_user("alice", "Invoice.View");

        assert_eq!(store.get_permissions_for_user("alice").len(), 1);
    }

    #[test]
    fn test_unknown_principal_is_empty() {
        let store = InMemoryPermissionStore::new();
        assert!(store.get_permissions_for_user("nobody").is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = InMemoryPermissionStore::new();
        store.remove_permission_from_user("nobody", "Invoice.View");
        store.add_permission_to_user("alice", "Invoice.View");
        store.remove_permission_from_user("alice", "Invoice.Edit");

        assert!(store.get_permissions_for_user("nobody").is_empty());
        assert_eq!(store.get_permissions_for_user("alice").len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = InMemoryPermissionStore::new();
        store.add_permission_to_user("alice", "Invoice.View");
        store.remove_permission_from_user("alice", "Invoice.View");
        assert!(store.get_permissions_for_user("alice").is_empty());
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = InMemoryPermissionStore::new();
        store.add_permission_to_user("alice", "Invoice.View");

        let mut snapshot = store.get_permissions_for_user("alice");
        snapshot.insert("Invoice.Delete".to_string());
        snapshot.remove("Invoice.View");

        let fresh = store.get_permissions_for_user("alice");
        assert!(fresh.contains("Invoice.View"));
        assert!(!fresh.contains("Invoice.Delete"));
    }

    #[test]
    fn test_permissions_are_case_sensitive() {
        let store = InMemoryPermissionStore::new();
        store.add_permission_to_user("alice", "Invoice.View");
        let perms = store.get_permissions_for_user("alice");
        assert!(!perms.contains("invoice.view"));
    }

    #[test]
    fn test_empty_permission_accepted() {
        let store = InMemoryPermissionStore::new();
        store.add_permission_to_user("alice", "");
        assert!(store.get_permissions_for_user("alice").contains(""));
    }

    #[test]
    fn test_global_permissions() {
        let store = InMemoryPermissionStore::new();
        store.add_global_permission("Report.View");
        store.add_global_permission("Report.View");
        store.add_global_permission("Dashboard.View");

        let mut all = store.get_all_permissions();
        all.sort();
        assert_eq!(all, vec!["Dashboard.View", "Report.View"]);

        store.remove_global_permission("Report.View");
        store.remove_global_permission("Never.Granted");
        assert_eq!(store.get_all_permissions(), vec!["Dashboard.View"]);
    }

    #[test]
    fn test_global_does_not_leak_into_user_set() {
        let store = InMemoryPermissionStore::new();
        store.add_global_permission("Report.View");
        assert!(store.get_permissions_for_user("alice").is_empty());
    }

    #[test]
    fn test_seed() {
        let store = InMemoryPermissionStore::new();
        store.seed(
            vec!["Report.View".to_string()],
            vec![(
                "alice".to_string(),
                vec!["Invoice.View".to_string(), "Invoice.Edit".to_string()],
            )],
        );

        assert_eq!(store.principal_count(), 1);
        assert_eq!(store.get_permissions_for_user("alice").len(), 2);
        assert!(store.global_permissions().contains("Report.View"));
    }

    #[test]
    fn test_concurrent_mutation() {
        let store = Arc::new(InMemoryPermissionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.add_permission_to_user("shared", &format!("p{i}"));
                        store.add_permission_to_user(&format!("user{t}"), &format!("p{i}"));
                        store.add_global_permission(&format!("g{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_permissions_for_user("shared").len(), 100);
        for t in 0..8 {
            assert_eq!(store.get_permissions_for_user(&format!("user{t}")).len(), 100);
        }
        assert_eq!(store.get_all_permissions().len(), 100);
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn PermissionStore) {}
    }
}
