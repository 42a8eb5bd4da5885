//! Job reconciliation against the quantum backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use qwhisk_ibmq::QuantumBackend;
use qwhisk_store::Store;
use qwhisk_types::{Job, JobStatus};

use crate::config::NetworkConfig;
use crate::error::EngineResult;
use crate::notify::NotificationDispatcher;

/// Reconciles locally non-terminal jobs with the backend's job records.
pub struct JobPoller {
    store: Arc<dyn Store>,
    backend: Arc<dyn QuantumBackend>,
    notifier: Arc<NotificationDispatcher>,
    network: NetworkConfig,
}

impl JobPoller {
    pub fn new(
        store: Arc<dyn Store>,
        backend: Arc<dyn QuantumBackend>,
        notifier: Arc<NotificationDispatcher>,
        network: NetworkConfig,
    ) -> Self {
        Self {
            store,
            backend,
            notifier,
            network,
        }
    }

    /// Run the reconciliation loop on a fixed interval.
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = poller.poll_once().await {
                    tracing::error!("job reconciliation failed: {}", e);
                }
            }
        })
    }

    /// One reconciliation pass over every non-terminal job.
    ///
    /// Failures on one job are logged and do not block the rest of the
    /// batch; that job simply stays stale until the next pass.
    pub async fn poll_once(&self) -> EngineResult<()> {
        let jobs = self.store.active_jobs().await?;
        if jobs.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = jobs.len(), "reconciling active jobs");

        for mut job in jobs {
            if let Err(e) = self.reconcile(&mut job).await {
                tracing::warn!(
                    job = %job.backend_job_id,
                    error = %e,
                    "job reconciliation failed, will retry next cycle"
                );
            }
        }
        Ok(())
    }

    async fn reconcile(&self, job: &mut Job) -> EngineResult<()> {
        let detail = self
            .backend
            .job(
                &self.network.hub,
                &self.network.group,
                &self.network.project,
                &job.backend_job_id,
            )
            .await?;

        match detail.status.parse::<JobStatus>() {
            Ok(status) => job.status = status,
            Err(e) => {
                tracing::warn!(job = %job.backend_job_id, "{e}, keeping previous status");
            }
        }
        job.record_steps(&detail.time_per_step);
        if detail.creation_date.is_some() {
            job.creation_date = detail.creation_date;
        }
        if detail.end_date.is_some() {
            job.end_date = detail.end_date;
        }

        if job.status == JobStatus::Completed {
            job.success = detail.summary_data.and_then(|summary| summary.success);
            let result = self
                .backend
                .job_result(
                    &self.network.hub,
                    &self.network.group,
                    &self.network.project,
                    &job.backend_job_id,
                )
                .await?;
            job.result = Some(result);
        }

        self.notifier.dispatch(job).await?;
        self.store.save_job(job).await?;
        Ok(())
    }
}
