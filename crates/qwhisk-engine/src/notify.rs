//! Job-status notification dispatch.
//!
//! Walks a job's reached statuses in ascending pipeline order and delivers
//! each one at most once. Applications with a notification address get one
//! direct message per newly reached status; applications without one get
//! their completed result routed through the trigger engine as an
//! `EXECUTION_RESULT` event instead.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use qwhisk_store::Store;
use qwhisk_types::{EventPayload, Job, JobStatus, QuantumApplication};

use crate::error::{EngineError, EngineResult};
use crate::triggers::TriggerEngine;

/// Direct notification body for one newly reached job status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobNotification {
    pub executed_application: String,
    pub status: JobStatus,
    pub status_reached: DateTime<Utc>,
    pub device: String,
    /// Present only for the terminal success status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_successful: Option<bool>,
    /// Present only for a successful terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<Value>,
}

/// Delivery channel for direct job-status notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification to an application-specified address.
    async fn send(&self, address: &str, notification: &JobNotification) -> EngineResult<()>;
}

/// Webhook sink: POSTs each notification as JSON to the address.
#[derive(Debug)]
pub struct HttpSink {
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new() -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Notify(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationSink for HttpSink {
    async fn send(&self, address: &str, notification: &JobNotification) -> EngineResult<()> {
        let response = self
            .client
            .post(address)
            .json(notification)
            .send()
            .await
            .map_err(|e| EngineError::Notify(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EngineError::Notify(format!(
                "{address} answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Recording sink used in tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    sent: Mutex<Vec<(String, JobNotification)>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, JobNotification)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemorySink {
    async fn send(&self, address: &str, notification: &JobNotification) -> EngineResult<()> {
        self.sent
            .lock()
            .await
            .push((address.to_string(), notification.clone()));
        Ok(())
    }
}

/// Walks job statuses and dispatches each newly reached one exactly once.
pub struct NotificationDispatcher {
    store: Arc<dyn Store>,
    sink: Arc<dyn NotificationSink>,
    triggers: Arc<TriggerEngine>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn NotificationSink>,
        triggers: Arc<TriggerEngine>,
    ) -> Self {
        Self {
            store,
            sink,
            triggers,
        }
    }

    /// Dispatch notifications for every reached-but-unsent status of `job`.
    ///
    /// Flags are flipped in place; the caller persists the job afterwards.
    /// A failed delivery leaves its flag unsent, so the next poller pass
    /// retries that status.
    pub async fn dispatch(&self, job: &mut Job) -> EngineResult<()> {
        let application = self
            .store
            .application(&job.application)
            .await?
            .ok_or_else(|| EngineError::not_found("application", &job.application))?;

        for status in JobStatus::PIPELINE {
            let Some(details) = job.status_details.get(&status) else {
                continue;
            };
            if details.notification_sent {
                continue;
            }
            let reached_at = details.reached_at;
            self.dispatch_one(job, &application, status, reached_at)
                .await?;
            if let Some(details) = job.status_details.get_mut(&status) {
                details.notification_sent = true;
            }
        }
        Ok(())
    }

    async fn dispatch_one(
        &self,
        job: &Job,
        application: &QuantumApplication,
        status: JobStatus,
        reached_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        match &application.notification_address {
            Some(address) => {
                let notification = Self::notification(job, application, status, reached_at);
                tracing::debug!(
                    application = %application.name,
                    %status,
                    "sending job status notification"
                );
                self.sink.send(address, &notification).await
            }
            None => {
                if status == JobStatus::Completed {
                    let payload = EventPayload::execution_result(
                        application.name.clone(),
                        job.device.clone(),
                        job.result.clone().unwrap_or(Value::Null),
                    );
                    tracing::debug!(
                        application = %application.name,
                        "routing completed job through execution-result triggers"
                    );
                    self.triggers.emit(&payload).await?;
                }
                Ok(())
            }
        }
    }

    fn notification(
        job: &Job,
        application: &QuantumApplication,
        status: JobStatus,
        reached_at: DateTime<Utc>,
    ) -> JobNotification {
        let terminal_success = status == JobStatus::Completed;
        JobNotification {
            executed_application: application.name.clone(),
            status,
            status_reached: reached_at,
            device: job.device.clone(),
            execution_successful: terminal_success.then(|| job.success.unwrap_or(true)),
            execution_result: (terminal_success && job.success.unwrap_or(true))
                .then(|| job.result.clone().unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_shape() {
        let mut job = Job::spawned("b-1", "ibmq_lima", None, "shor");
        job.success = Some(true);
        job.result = Some(serde_json::json!({"counts": {"00": 512}}));
        let application =
            QuantumApplication::new("shor", "code", None, Some("http://sink".into()), "local");

        let notification = NotificationDispatcher::notification(
            &job,
            &application,
            JobStatus::Completed,
            Utc::now(),
        );
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["executedApplication"], "shor");
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["device"], "ibmq_lima");
        assert_eq!(json["executionSuccessful"], true);
        assert_eq!(json["executionResult"]["counts"]["00"], 512);
    }

    #[test]
    fn test_non_terminal_notification_omits_result_fields() {
        let job = Job::spawned("b-1", "ibmq_lima", None, "shor");
        let application = QuantumApplication::new("shor", "code", None, None, "local");

        let notification =
            NotificationDispatcher::notification(&job, &application, JobStatus::Queued, Utc::now());
        let json = serde_json::to_value(&notification).unwrap();
        assert!(json.get("executionSuccessful").is_none());
        assert!(json.get("executionResult").is_none());
    }
}
