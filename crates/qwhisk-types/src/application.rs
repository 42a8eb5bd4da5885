//! Quantum applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Default container image used when none is given at creation time.
pub const DEFAULT_IMAGE: &str = "openwhisk/python-qiskit:latest";

/// A deployable unit of quantum code bound to one provider.
///
/// Creating an application deploys an action of the same name on the
/// provider's FaaS runtime; every invocation of that action is mirrored
/// locally as a [`crate::ScriptExecution`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantumApplication {
    pub id: EntityId,
    /// Unique application name; doubles as the remote action name.
    pub name: String,
    /// Base64-encoded source payload.
    pub code: String,
    /// Container image the action runs in.
    pub docker_image: String,
    /// Destination for direct job-status notifications. When unset,
    /// completed results are delivered through execution-result triggers
    /// instead.
    pub notification_address: Option<String>,
    /// Owning provider name.
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

impl QuantumApplication {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        docker_image: Option<String>,
        notification_address: Option<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            code: code.into(),
            docker_image: docker_image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            notification_address,
            provider: provider.into(),
            created_at: Utc::now(),
        }
    }
}
