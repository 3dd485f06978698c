//! Authorization decisions for protected operations.
//!
//! The credential layer hands over an already-validated
//! [`CredentialSet`]; this module never parses tokens or headers. The
//! evaluator resolves the principal from a configurable attribute and asks
//! the [`PermissionCacheService`] for the required permission.
//!
//! ```text
//! not authenticated ─────────────────────────► Unauthenticated
//! authenticated ─► no / empty principal id ──► Unauthenticated
//!               └► principal id ─► has permission? ─ yes ─► Allow
//!                                                  └ no ──► Forbidden
//! ```
//!
//! Errors from the cache or store propagate unchanged; an outage is never
//! reported as a denial.

use std::collections::HashMap;
use std::sync::Arc;

use fabryk_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::config::AclConfig;
use crate::service::PermissionCacheService;
use crate::store::PermissionStore;

/// Outcome of a single authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationDecision {
    /// The principal holds the required permission.
    Allow,
    /// No usable identity was presented.
    Unauthenticated,
    /// The principal is known but lacks the permission.
    Forbidden,
}

impl AuthorizationDecision {
    /// Returns true if access was granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl std::fmt::Display for AuthorizationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Forbidden => f.write_str("forbidden"),
        }
    }
}

/// Identity information delivered by the credential layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Whether the credential layer authenticated the request.
    pub authenticated: bool,

    /// Claims or attributes attached to the credential.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl CredentialSet {
    /// An unauthenticated credential set.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated credential set with no attributes yet.
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Read the principal id from `attributes`.
///
/// Returns `None` when the attribute is missing or empty.
pub fn extract_principal_id<'a>(
    attributes: &'a HashMap<String, String>,
    attribute_name: &str,
) -> Option<&'a str> {
    attributes
        .get(attribute_name)
        .map(String::as_str)
        .filter(|id| !id.is_empty())
}

/// Maps credential sets to [`AuthorizationDecision`]s.
#[derive(Debug, Clone)]
pub struct AuthorizationEvaluator {
    service: PermissionCacheService,
    identifier_attribute: String,
}

impl AuthorizationEvaluator {
    /// Create an evaluator reading the principal id from `identifier_attribute`.
    pub fn new(service: PermissionCacheService, identifier_attribute: impl Into<String>) -> Self {
        Self {
            service,
            identifier_attribute: identifier_attribute.into(),
        }
    }

    /// Build the full engine from configuration: backend, service, and evaluator.
    pub async fn from_config(store: Arc<dyn PermissionStore>, config: &AclConfig) -> Result<Self> {
        let service = PermissionCacheService::from_config(store, config).await?;
        Ok(Self::new(service, config.identifier_attribute.clone()))
    }

    /// The attribute the principal id is read from.
    pub fn identifier_attribute(&self) -> &str {
        &self.identifier_attribute
    }

    /// The permission service consulted for decisions.
    pub fn service(&self) -> &PermissionCacheService {
        &self.service
    }

    /// Decide whether `credentials` grant `required_permission`.
    ///
    /// The required permission is checked before the credentials, so an
    /// empty permission is an error even for an anonymous request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `required_permission` is empty, and
    /// propagates any cache infrastructure error.
    pub async fn evaluate(
        &self,
        credentials: &CredentialSet,
        required_permission: &str,
    ) -> Result<AuthorizationDecision> {
        if required_permission.is_empty() {
            return Err(Error::config("required permission must not be empty"));
        }

        if !credentials.authenticated {
            return Ok(AuthorizationDecision::Unauthenticated);
        }

        let Some(principal) =
            extract_principal_id(&credentials.attributes, &self.identifier_attribute)
        else {
            log::debug!(
                "authenticated credentials carry no '{}' attribute",
                self.identifier_attribute
            );
            return Ok(AuthorizationDecision::Unauthenticated);
        };

        let decision = if self
            .service
            .has_permission(principal, required_permission)
            .await?
        {
            AuthorizationDecision::Allow
        } else {
            AuthorizationDecision::Forbidden
        };

        log::debug!("{principal} -> {required_permission}: {decision}");
        Ok(decision)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalCache;
    use crate::store::InMemoryPermissionStore;
    use std::time::Duration;

    fn evaluator() -> AuthorizationEvaluator {
        let service = PermissionCacheService::new(
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(LocalCache::new(Duration::from_secs(60))),
        );
        AuthorizationEvaluator::new(service, "name")
    }

    #[test]
    fn test_extract_principal_id() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), "alice".to_string());
        attrs.insert("sub".to_string(), String::new());

        assert_eq!(extract_principal_id(&attrs, "name"), Some("alice"));
        assert_eq!(extract_principal_id(&attrs, "sub"), None);
        assert_eq!(extract_principal_id(&attrs, "email"), None);
        assert_eq!(extract_principal_id(&attrs, "Name"), None);
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthenticated() {
        let evaluator = evaluator();
        let decision = evaluator
            .evaluate(&CredentialSet::anonymous(), "Invoice.View")
            .await
            .unwrap();
        assert_eq!(decision, AuthorizationDecision::Unauthenticated);
    }

    #[tokio::test]
    async fn test_unauthenticated_with_attributes_is_unauthenticated() {
        let evaluator = evaluator();
        evaluator
            .service()
            .add_permission_to_user("alice", "Invoice.View")
            .await
            .unwrap();

        let credentials = CredentialSet::anonymous().with_attribute("name", "alice");
        let decision = evaluator.evaluate(&credentials, "Invoice.View").await.unwrap();
        assert_eq!(decision, AuthorizationDecision::Unauthenticated);
    }

    #[tokio::test]
    async fn test_missing_identifier_is_unauthenticated() {
        let evaluator = evaluator();
        let credentials = CredentialSet::authenticated().with_attribute("email", "a@example.com");
        let decision = evaluator.evaluate(&credentials, "Invoice.View").await.unwrap();
        assert_eq!(decision, AuthorizationDecision::Unauthenticated);

        let credentials = CredentialSet::authenticated().with_attribute("name", "");
        let decision = evaluator.evaluate(&credentials, "Invoice.View").await.unwrap();
        assert_eq!(decision, AuthorizationDecision::Unauthenticated);
    }

    #[tokio::test]
    async fn test_allow_and_forbidden() {
        let evaluator = evaluator();
        let credentials = CredentialSet::authenticated().with_attribute("name", "alice");

        let decision = evaluator.evaluate(&credentials, "Invoice.View").await.unwrap();
        assert_eq!(decision, AuthorizationDecision::Forbidden);
        assert!(!decision.is_allowed());

        evaluator
            .service()
            .add_permission_to_user("alice", "Invoice.View")
            .await
            .unwrap();
        let decision = evaluator.evaluate(&credentials, "Invoice.View").await.unwrap();
        assert_eq!(decision, AuthorizationDecision::Allow);
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_custom_identifier_attribute() {
        let service = PermissionCacheService::new(
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(LocalCache::new(Duration::from_secs(60))),
        );
        service
            .add_permission_to_user("user-42", "Invoice.View")
            .await
            .unwrap();
        let evaluator = AuthorizationEvaluator::new(service, "sub");
        assert_eq!(evaluator.identifier_attribute(), "sub");

        let credentials = CredentialSet::authenticated()
            .with_attribute("name", "alice")
            .with_attribute("sub", "user-42");
        let decision = evaluator.evaluate(&credentials, "Invoice.View").await.unwrap();
        assert_eq!(decision, AuthorizationDecision::Allow);
    }

    #[tokio::test]
    async fn test_empty_required_permission_rejected() {
        let evaluator = evaluator();
        let credentials = CredentialSet::authenticated().with_attribute("name", "alice");
        let err = evaluator.evaluate(&credentials, "").await.unwrap_err();
        assert!(err.is_config());

        let err = evaluator
            .evaluate(&CredentialSet::anonymous(), "")
            .await
            .unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = AclConfig {
            identifier_attribute: "sub".into(),
            ..Default::default()
        };
        let evaluator =
            AuthorizationEvaluator::from_config(Arc::new(InMemoryPermissionStore::new()), &config)
                .await
                .unwrap();
        assert_eq!(evaluator.identifier_attribute(), "sub");
        assert_eq!(evaluator.service().cache().name(), "local");
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(AuthorizationDecision::Allow.to_string(), "allow");
        assert_eq!(
            AuthorizationDecision::Unauthenticated.to_string(),
            "unauthenticated"
        );
        assert_eq!(AuthorizationDecision::Forbidden.to_string(), "forbidden");
    }

    #[test]
    fn test_credential_set_deserialize() {
        let credentials: CredentialSet =
            serde_json::from_str(r#"{"authenticated":true,"attributes":{"name":"alice"}}"#)
                .unwrap();
        assert!(credentials.authenticated);
        assert_eq!(
            extract_principal_id(&credentials.attributes, "name"),
            Some("alice")
        );

        let credentials: CredentialSet = serde_json::from_str(r#"{"authenticated":false}"#).unwrap();
        assert!(credentials.attributes.is_empty());
    }
}
