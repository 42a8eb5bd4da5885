//! Script-execution materialization.
//!
//! A fired trigger's activation logs name one action activation per linked
//! rule; every such line becomes one RUNNING [`ScriptExecution`]. Direct
//! action invocation records one execution straight from the returned
//! activation id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use qwhisk_faas::FaasGateway;
use qwhisk_store::Store;
use qwhisk_types::{redact_api_token, Provider, ScriptExecution};

use crate::error::{EngineError, EngineResult};

/// One trigger-activation log line naming a fired action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivationLogLine {
    activation_id: String,
    /// Fully qualified action path, `/{namespace}/{name}`.
    action: String,
}

/// Extract the action name out of a fully qualified `/{namespace}/{name}`
/// path.
fn action_name(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Serialize invocation input with secrets redacted, for persistence.
fn redacted_params(params: &Value) -> String {
    let mut params = params.clone();
    redact_api_token(&mut params);
    params.to_string()
}

/// Creates and records script executions.
pub struct ExecutionService {
    store: Arc<dyn Store>,
    faas: Arc<dyn FaasGateway>,
}

impl ExecutionService {
    pub fn new(store: Arc<dyn Store>, faas: Arc<dyn FaasGateway>) -> Self {
        Self { store, faas }
    }

    /// Materialize one RUNNING execution per activation-log line that names
    /// a known application's action.
    ///
    /// Malformed lines and unknown applications are skipped with a log
    /// entry; the remaining lines still materialize.
    pub async fn create_from_logs(
        &self,
        provider: &Provider,
        logs: &[String],
        fired_at: DateTime<Utc>,
        input_params: &Value,
    ) -> EngineResult<Vec<ScriptExecution>> {
        let input_params = redacted_params(input_params);
        let mut created = Vec::new();

        for line in logs {
            let parsed: ActivationLogLine = match serde_json::from_str(line) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(%line, error = %e, "skipping malformed activation log line");
                    continue;
                }
            };
            let Some(name) = action_name(&parsed.action) else {
                tracing::warn!(action = %parsed.action, "skipping log line with empty action path");
                continue;
            };
            let Some(application) = self.store.application(name).await? else {
                tracing::warn!(application = name, "skipping activation of unknown application");
                continue;
            };

            let execution = ScriptExecution::running(
                parsed.activation_id,
                provider.name.clone(),
                application.name,
                input_params.clone(),
            )
            .with_trigger_fired_at(fired_at);
            self.store.save_execution(&execution).await?;
            created.push(execution);
        }
        Ok(created)
    }

    /// Invoke an application's action directly and record the resulting
    /// RUNNING execution.
    pub async fn invoke(
        &self,
        application_name: &str,
        params: &Value,
    ) -> EngineResult<ScriptExecution> {
        let application = self
            .store
            .application(application_name)
            .await?
            .ok_or_else(|| EngineError::not_found("application", application_name))?;
        let provider = self
            .store
            .provider(&application.provider)
            .await?
            .ok_or_else(|| EngineError::not_found("provider", &application.provider))?;

        let activation = self
            .faas
            .invoke_action(&provider, &application.name, params)
            .await?;
        tracing::info!(
            application = %application.name,
            activation = %activation.activation_id,
            "action invoked"
        );

        let execution = ScriptExecution::running(
            activation.activation_id,
            provider.name,
            application.name,
            redacted_params(params),
        );
        self.store.save_execution(&execution).await?;
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_name_extraction() {
        assert_eq!(action_name("/guest/shor"), Some("shor"));
        assert_eq!(action_name("/a/b/c"), Some("c"));
        assert_eq!(action_name("/guest/"), None);
    }

    #[test]
    fn test_log_line_parsing() {
        let line = r#"{"activationId": "act-1", "action": "/guest/shor"}"#;
        let parsed: ActivationLogLine = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.activation_id, "act-1");
        assert_eq!(parsed.action, "/guest/shor");

        assert!(serde_json::from_str::<ActivationLogLine>("not json").is_err());
        assert!(serde_json::from_str::<ActivationLogLine>(r#"{"action": "/a/b"}"#).is_err());
    }

    #[test]
    fn test_redacted_params() {
        let params = json!({"device": "ibmq_lima", "apiToken": "hunter2"});
        let serialized = redacted_params(&params);
        assert!(!serialized.contains("hunter2"));
        assert!(serialized.contains("ibmq_lima"));
    }
}
