//! Property tests for the union law and idempotence.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fabryk_acl::{
    InMemoryPermissionStore, LocalCache, PermissionCacheService, PermissionStore, cache_key,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Grant(usize, usize),
    Revoke(usize, usize),
    GrantGlobal(usize),
    RevokeGlobal(usize),
    Read(usize),
}

const PRINCIPALS: [&str; 3] = ["alice", "bob", "carol"];
const PERMISSIONS: [&str; 4] = ["Invoice.View", "Invoice.Edit", "Report.View", "invoice.view"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PRINCIPALS.len(), 0..PERMISSIONS.len()).prop_map(|(p, x)| Op::Grant(p, x)),
        (0..PRINCIPALS.len(), 0..PERMISSIONS.len()).prop_map(|(p, x)| Op::Revoke(p, x)),
        (0..PERMISSIONS.len()).prop_map(Op::GrantGlobal),
        (0..PERMISSIONS.len()).prop_map(Op::RevokeGlobal),
        (0..PRINCIPALS.len()).prop_map(Op::Read),
    ]
}

fn new_service() -> PermissionCacheService {
    PermissionCacheService::new(
        Arc::new(InMemoryPermissionStore::new()),
        Arc::new(LocalCache::new(Duration::from_secs(300))),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    /// With no global writes after a principal's view is cached, every
    /// check agrees with the model `user ∪ global`.
    #[test]
    fn prop_union_law_without_global_churn(
        globals in proptest::collection::vec(0..PERMISSIONS.len(), 0..4),
        ops in proptest::collection::vec(op(), 0..40),
    ) {
        runtime().block_on(async {
            let service = new_service();

            let mut model_global = HashSet::new();
            for g in &globals {
                service.add_global_permission(PERMISSIONS[*g]).await;
                model_global.insert(PERMISSIONS[*g]);
            }

            let mut model_users: Vec<HashSet<&str>> = vec![HashSet::new(); PRINCIPALS.len()];
            for op in ops {
                match op {
                    Op::Grant(p, x) => {
                        service.add_permission_to_user(PRINCIPALS[p], PERMISSIONS[x]).await.unwrap();
                        model_users[p].insert(PERMISSIONS[x]);
                    }
                    Op::Revoke(p, x) => {
                        service.remove_permission_from_user(PRINCIPALS[p], PERMISSIONS[x]).await.unwrap();
                        model_users[p].remove(PERMISSIONS[x]);
                    }
                    // Global churn is exercised separately below.
                    Op::GrantGlobal(_) | Op::RevokeGlobal(_) => {}
                    Op::Read(p) => {
                        service.get_user_permissions(PRINCIPALS[p]).await.unwrap();
                    }
                }
            }

            for (p, principal) in PRINCIPALS.iter().enumerate() {
                for permission in PERMISSIONS {
                    let expected = model_users[p].contains(permission) || model_global.contains(permission);
                    let actual = service.has_permission(principal, permission).await.unwrap();
                    prop_assert_eq!(actual, expected, "{} / {}", principal, permission);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Once every cached view is invalidated, the union law holds even
    /// after arbitrary global churn.
    #[test]
    fn prop_union_law_at_quiescence(ops in proptest::collection::vec(op(), 0..40)) {
        runtime().block_on(async {
            let store = Arc::new(InMemoryPermissionStore::new());
            let service = PermissionCacheService::new(
                store.clone(),
                Arc::new(LocalCache::new(Duration::from_secs(300))),
            );

            for op in ops {
                match op {
                    Op::Grant(p, x) => service.add_permission_to_user(PRINCIPALS[p], PERMISSIONS[x]).await.unwrap(),
                    Op::Revoke(p, x) => service.remove_permission_from_user(PRINCIPALS[p], PERMISSIONS[x]).await.unwrap(),
                    Op::GrantGlobal(x) => service.add_global_permission(PERMISSIONS[x]).await,
                    Op::RevokeGlobal(x) => service.remove_global_permission(PERMISSIONS[x]).await,
                    Op::Read(p) => { service.get_user_permissions(PRINCIPALS[p]).await.unwrap(); }
                }
            }

            let global: HashSet<String> = service.get_all_permissions().await.into_iter().collect();
            for principal in PRINCIPALS {
                service.cache().invalidate(&cache_key(principal)).await.unwrap();
                let user = store.get_permissions_for_user(principal);
                for permission in PERMISSIONS {
                    let expected = user.contains(permission) || global.contains(permission);
                    let actual = service.has_permission(principal, permission).await.unwrap();
                    prop_assert_eq!(actual, expected, "{} / {}", principal, permission);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Granting the same permission repeatedly is the same as granting it once.
    #[test]
    fn prop_grant_is_idempotent(x in 0..PERMISSIONS.len(), times in 1usize..5) {
        runtime().block_on(async {
            let once = new_service();
            let many = new_service();

            once.add_permission_to_user("alice", PERMISSIONS[x]).await.unwrap();
            let expected = once.get_user_permissions("alice").await.unwrap();

            for _ in 0..times {
                many.add_permission_to_user("alice", PERMISSIONS[x]).await.unwrap();
            }
            prop_assert_eq!(many.get_user_permissions("alice").await.unwrap(), expected);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
