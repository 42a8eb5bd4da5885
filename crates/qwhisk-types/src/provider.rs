//! FaaS-runtime providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// A registered FaaS runtime endpoint.
///
/// A provider owns the applications, triggers, executions and jobs created
/// against it; deleting a provider tears all of them down (see the engine's
/// provider service for the teardown order).
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: EntityId,
    /// Unique provider name.
    pub name: String,
    /// Base URL of the runtime's REST API (up to `/api/v1`).
    pub base_url: String,
    /// Namespace all deployed actions/triggers/rules live in.
    pub namespace: String,
    /// Base64-encoded `user:password` basic-auth credential.
    pub basic_credentials: String,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        namespace: impl Into<String>,
        basic_credentials: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            base_url: base_url.into(),
            namespace: namespace.into(),
            basic_credentials: basic_credentials.into(),
            created_at: Utc::now(),
        }
    }

    /// Composite identity used when checking that a trigger and an
    /// application were registered against the same runtime namespace.
    pub fn namespace_key(&self) -> (&str, &str) {
        (&self.name, &self.namespace)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("basic_credentials", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_key_equality() {
        let a = Provider::new("ow-local", "http://localhost:3233/api/v1", "guest", "Zm9v");
        let b = Provider::new("ow-local", "http://localhost:3233/api/v1", "guest", "YmFy");
        let c = Provider::new("ow-local", "http://localhost:3233/api/v1", "other", "Zm9v");
        assert_eq!(a.namespace_key(), b.namespace_key());
        assert_ne!(a.namespace_key(), c.namespace_key());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let p = Provider::new("ow", "http://x", "guest", "c2VjcmV0");
        let dbg = format!("{p:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("c2VjcmV0"));
    }
}
