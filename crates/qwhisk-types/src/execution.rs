//! FaaS-activation mirrors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EntityId;

/// Placeholder shown instead of a secret in persisted input parameters.
pub const REDACTED: &str = "**********";

/// Lifecycle of a mirrored activation. Terminal once Success or Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Success,
    Error,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// Application-defined activation result. Currently a quantum-backend job
/// id is the only field every qwhisk action reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub job_id: String,
}

/// Local mirror of one FaaS-runtime activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptExecution {
    pub id: EntityId,
    /// Activation id on the FaaS runtime.
    pub activation_id: String,
    /// Owning provider name.
    pub provider: String,
    /// Owning application name.
    pub application: String,
    #[serde(default)]
    pub logs: Vec<String>,
    /// Serialized invocation input, secrets already redacted.
    pub input_params: String,
    pub trigger_fired_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub result: Option<ExecutionResult>,
    pub status: ExecutionStatus,
}

impl ScriptExecution {
    /// A running execution freshly created from an activation id.
    pub fn running(
        activation_id: impl Into<String>,
        provider: impl Into<String>,
        application: impl Into<String>,
        input_params: String,
    ) -> Self {
        Self {
            id: EntityId::new(),
            activation_id: activation_id.into(),
            provider: provider.into(),
            application: application.into(),
            logs: Vec::new(),
            input_params,
            trigger_fired_at: None,
            started_at: None,
            ended_at: None,
            duration_ms: None,
            result: None,
            status: ExecutionStatus::Running,
        }
    }

    pub fn with_trigger_fired_at(mut self, at: DateTime<Utc>) -> Self {
        self.trigger_fired_at = Some(at);
        self
    }
}

/// Replace the `apiToken` property of a JSON parameter object with a
/// placeholder. Input parameters pass through here before persistence.
pub fn redact_api_token(params: &mut Value) {
    if let Some(obj) = params.as_object_mut() {
        if let Some(token) = obj.get_mut("apiToken") {
            *token = Value::String(REDACTED.to_string());
        }
    }
}
