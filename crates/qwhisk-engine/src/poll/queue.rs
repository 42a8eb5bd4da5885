//! Queue-depth telemetry feeding the trigger engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use qwhisk_ibmq::{device_tuples, QuantumBackend};
use qwhisk_types::EventPayload;

use crate::error::EngineResult;
use crate::triggers::TriggerEngine;

/// Samples every reachable device queue and emits one QUEUE_SIZE event per
/// device.
pub struct QueuePoller {
    backend: Arc<dyn QuantumBackend>,
    triggers: Arc<TriggerEngine>,
}

impl QueuePoller {
    pub fn new(backend: Arc<dyn QuantumBackend>, triggers: Arc<TriggerEngine>) -> Self {
        Self { backend, triggers }
    }

    /// Run the telemetry loop on a fixed interval.
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = poller.poll_once().await {
                    tracing::error!("queue metrics cycle failed: {}", e);
                }
            }
        })
    }

    /// One telemetry pass over the full device topology.
    ///
    /// Best-effort: any failure aborts the current cycle and the next one
    /// starts from scratch.
    pub async fn poll_once(&self) -> EngineResult<()> {
        let hubs = self.backend.networks().await?;
        for device in device_tuples(&hubs) {
            let status = self
                .backend
                .queue_status(&device.hub, &device.group, &device.project, &device.device)
                .await?;
            tracing::debug!(
                device = %device.device,
                queue = status.length_queue,
                "sampled device queue"
            );
            self.triggers
                .emit(&EventPayload::queue_size(
                    device.device.clone(),
                    status.length_queue,
                ))
                .await?;
        }
        Ok(())
    }
}
