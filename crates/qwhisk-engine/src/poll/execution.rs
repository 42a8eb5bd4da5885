//! Script-execution reconciliation against the FaaS runtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde_json::Value;
use tokio::time::interval;

use qwhisk_faas::{Activation, FaasGateway};
use qwhisk_store::Store;
use qwhisk_types::{ExecutionStatus, Job, ScriptExecution};

use crate::error::{EngineError, EngineResult};

/// Reconciles RUNNING executions with their FaaS-runtime activations.
///
/// The only component that mutates execution rows after creation; it also
/// spawns the local Job mirror once an execution succeeds.
pub struct ExecutionPoller {
    store: Arc<dyn Store>,
    faas: Arc<dyn FaasGateway>,
}

impl ExecutionPoller {
    pub fn new(store: Arc<dyn Store>, faas: Arc<dyn FaasGateway>) -> Self {
        Self { store, faas }
    }

    /// Run the reconciliation loop on a fixed interval.
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = poller.poll_once().await {
                    tracing::error!("execution reconciliation failed: {}", e);
                }
            }
        })
    }

    /// One pass over every RUNNING execution. Failures on one execution are
    /// logged and the batch continues.
    pub async fn poll_once(&self) -> EngineResult<()> {
        let running = self
            .store
            .executions_by_status(ExecutionStatus::Running)
            .await?;
        for mut execution in running {
            if let Err(e) = self.reconcile(&mut execution).await {
                tracing::warn!(
                    activation = %execution.activation_id,
                    error = %e,
                    "execution reconciliation failed, will retry next cycle"
                );
            }
        }
        Ok(())
    }

    async fn reconcile(&self, execution: &mut ScriptExecution) -> EngineResult<()> {
        let provider = self
            .store
            .provider(&execution.provider)
            .await?
            .ok_or_else(|| EngineError::not_found("provider", &execution.provider))?;

        // Absent means not yet materialized on the runtime; retried next
        // cycle rather than treated as a failure.
        let Some(activation) = self
            .faas
            .activation(&provider, &execution.activation_id)
            .await?
        else {
            tracing::debug!(
                activation = %execution.activation_id,
                "activation not yet available"
            );
            return Ok(());
        };

        apply_activation(execution, &activation);

        if execution.status == ExecutionStatus::Success {
            match self.spawn_job(execution) {
                Ok(job) => self.store.save_job(&job).await?,
                Err(e) => {
                    tracing::warn!(
                        activation = %execution.activation_id,
                        error = %e,
                        "successful execution without a usable result, no job spawned"
                    );
                }
            }
        }
        self.store.save_execution(execution).await?;
        Ok(())
    }

    /// Build the Job mirror for a successful execution. The backend job id
    /// comes from the decoded result; the device from the execution's own
    /// input parameters.
    fn spawn_job(&self, execution: &ScriptExecution) -> EngineResult<Job> {
        let result = execution
            .result
            .as_ref()
            .ok_or_else(|| EngineError::Decode("activation result missing".into()))?;
        let device = device_from_params(&execution.input_params).ok_or_else(|| {
            EngineError::Decode("no device in execution input parameters".into())
        })?;
        Ok(Job::spawned(
            result.job_id.clone(),
            device,
            Some(execution.input_params.clone()),
            execution.application.clone(),
        ))
    }
}

/// Copy an activation's outcome onto the execution mirror.
fn apply_activation(execution: &mut ScriptExecution, activation: &Activation) {
    execution.status = if activation.response.success {
        ExecutionStatus::Success
    } else {
        ExecutionStatus::Error
    };
    execution.started_at = activation.start.and_then(DateTime::from_timestamp_millis);
    execution.ended_at = activation.end.and_then(DateTime::from_timestamp_millis);
    execution.duration_ms = activation.duration;
    execution.logs = activation.logs.clone();

    if let Some(result) = &activation.response.result {
        match serde_json::from_value(result.clone()) {
            Ok(decoded) => execution.result = Some(decoded),
            Err(e) => {
                tracing::warn!(
                    activation = %execution.activation_id,
                    error = %e,
                    "activation result did not decode"
                );
            }
        }
    }
}

/// Pull the `device` property out of serialized invocation input.
fn device_from_params(input_params: &str) -> Option<String> {
    let params: Value = serde_json::from_str(input_params).ok()?;
    params
        .get("device")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qwhisk_faas::ActivationResponse;

    #[test]
    fn test_device_from_params() {
        assert_eq!(
            device_from_params(r#"{"device": "ibmq_lima", "shots": 1024}"#),
            Some("ibmq_lima".to_string())
        );
        assert_eq!(device_from_params(r#"{"shots": 1024}"#), None);
        assert_eq!(device_from_params("not json"), None);
    }

    #[test]
    fn test_apply_activation_success() {
        let mut execution =
            ScriptExecution::running("act-1", "local", "shor", r#"{"device":"d1"}"#.into());
        let activation = Activation {
            activation_id: "act-1".into(),
            start: Some(1_677_660_000_000),
            end: Some(1_677_660_004_000),
            duration: Some(4000),
            logs: vec!["line".into()],
            response: ActivationResponse {
                success: true,
                result: Some(serde_json::json!({"jobId": "backend-7"})),
            },
        };

        apply_activation(&mut execution, &activation);
        assert_eq!(execution.status, ExecutionStatus::Success);
        assert_eq!(execution.duration_ms, Some(4000));
        assert_eq!(execution.result.as_ref().unwrap().job_id, "backend-7");
        assert!(execution.started_at.unwrap() < execution.ended_at.unwrap());
    }

    #[test]
    fn test_apply_activation_error_keeps_result_empty() {
        let mut execution =
            ScriptExecution::running("act-1", "local", "shor", r#"{"device":"d1"}"#.into());
        let activation = Activation {
            activation_id: "act-1".into(),
            start: None,
            end: None,
            duration: None,
            logs: vec![],
            response: ActivationResponse {
                success: false,
                result: None,
            },
        };

        apply_activation(&mut execution, &activation);
        assert_eq!(execution.status, ExecutionStatus::Error);
        assert!(execution.result.is_none());
    }
}
