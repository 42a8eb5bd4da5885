//! Wire types of the OpenWhisk-shaped REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action deployment body (`PUT /actions/{name}?overwrite=true`).
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub publish: bool,
    pub exec: Exec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// Executable payload of an action. qwhisk always deploys blackbox
/// (container-image) actions.
#[derive(Debug, Clone, Serialize)]
pub struct Exec {
    pub kind: String,
    pub code: String,
    pub image: String,
}

/// Key/value annotation attached to a deployed entity.
#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub key: String,
    pub value: Value,
}

/// Trigger deployment body (`PUT /triggers/{name}?overwrite=true`).
#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub publish: bool,
}

/// Rule deployment body linking one trigger to one action.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub name: String,
    pub version: String,
    pub publish: bool,
    pub status: String,
    /// Fully qualified trigger path, `/{namespace}/{trigger}`.
    pub trigger: String,
    /// Fully qualified action path, `/{namespace}/{action}`.
    pub action: String,
}

/// Response of an action invocation or trigger fire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResult {
    pub activation_id: String,
}

/// One realized invocation record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub activation_id: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pub start: Option<i64>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub logs: Vec<String>,
    pub response: ActivationResponse,
}

/// Outcome carried inside an activation.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_deserialization() {
        let json = r#"{
            "activationId": "abc123",
            "start": 1677660000000,
            "end": 1677660004000,
            "duration": 4000,
            "logs": ["line one", "line two"],
            "response": {"success": true, "result": {"jobId": "j-1"}}
        }"#;
        let activation: Activation = serde_json::from_str(json).unwrap();
        assert_eq!(activation.activation_id, "abc123");
        assert_eq!(activation.duration, Some(4000));
        assert_eq!(activation.logs.len(), 2);
        assert!(activation.response.success);
    }

    #[test]
    fn test_activation_minimal() {
        let json = r#"{"activationId": "abc", "response": {}}"#;
        let activation: Activation = serde_json::from_str(json).unwrap();
        assert!(!activation.response.success);
        assert!(activation.logs.is_empty());
        assert!(activation.start.is_none());
    }

    #[test]
    fn test_rule_serialization() {
        let rule = Rule {
            name: "qs-trigger-shor".to_string(),
            version: "1.0".to_string(),
            publish: false,
            status: "active".to_string(),
            trigger: "/guest/qs-trigger".to_string(),
            action: "/guest/shor".to_string(),
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["trigger"], "/guest/qs-trigger");
        assert_eq!(json["action"], "/guest/shor");
        assert_eq!(json["status"], "active");
    }
}
