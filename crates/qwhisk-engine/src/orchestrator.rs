//! Broker assembly.
//!
//! Wires the store, the two remote clients and the notification sink into
//! the engine services, and runs the three reconciliation pollers.

use std::sync::Arc;

use tokio::task::JoinHandle;

use qwhisk_faas::{FaasGateway, OpenWhiskClient};
use qwhisk_ibmq::{IbmqClient, QuantumBackend};
use qwhisk_store::{JsonStore, MemoryStore, Store};

use crate::applications::ApplicationService;
use crate::config::Config;
use crate::error::EngineResult;
use crate::executions::ExecutionService;
use crate::notify::{HttpSink, NotificationDispatcher, NotificationSink};
use crate::poll::{ExecutionPoller, JobPoller, QueuePoller};
use crate::providers::ProviderService;
use crate::triggers::TriggerEngine;

/// The assembled broker: every engine service plus the poller handles.
pub struct Broker {
    config: Config,
    pub store: Arc<dyn Store>,
    pub providers: Arc<ProviderService>,
    pub applications: Arc<ApplicationService>,
    pub triggers: Arc<TriggerEngine>,
    pub executions: Arc<ExecutionService>,
    job_poller: Arc<JobPoller>,
    queue_poller: Arc<QueuePoller>,
    execution_poller: Arc<ExecutionPoller>,
}

impl Broker {
    /// Assemble the broker with production clients selected from `config`.
    pub async fn from_config(config: Config) -> EngineResult<Self> {
        let store: Arc<dyn Store> = match &config.store.path {
            Some(path) => Arc::new(JsonStore::new(path).await?),
            None => Arc::new(MemoryStore::new()),
        };
        let backend: Arc<dyn QuantumBackend> = Arc::new(IbmqClient::new(
            config.backend.endpoint.clone(),
            config.backend.api_token.clone(),
        )?);
        let faas: Arc<dyn FaasGateway> = Arc::new(OpenWhiskClient::new()?);
        let sink: Arc<dyn NotificationSink> = Arc::new(HttpSink::new()?);
        Ok(Self::assemble(config, store, backend, faas, sink))
    }

    /// Assemble the broker from explicit collaborators.
    pub fn assemble(
        config: Config,
        store: Arc<dyn Store>,
        backend: Arc<dyn QuantumBackend>,
        faas: Arc<dyn FaasGateway>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let executions = Arc::new(ExecutionService::new(store.clone(), faas.clone()));
        let triggers = Arc::new(TriggerEngine::new(
            store.clone(),
            faas.clone(),
            executions.clone(),
            config.backend.api_token.clone(),
        ));
        let notifier = Arc::new(NotificationDispatcher::new(
            store.clone(),
            sink,
            triggers.clone(),
        ));
        let providers = Arc::new(ProviderService::new(store.clone(), faas.clone()));
        let applications = Arc::new(ApplicationService::new(
            store.clone(),
            faas.clone(),
            triggers.clone(),
            executions.clone(),
        ));

        let job_poller = Arc::new(JobPoller::new(
            store.clone(),
            backend.clone(),
            notifier,
            config.network.clone(),
        ));
        let queue_poller = Arc::new(QueuePoller::new(backend, triggers.clone()));
        let execution_poller = Arc::new(ExecutionPoller::new(store.clone(), faas));

        Self {
            config,
            store,
            providers,
            applications,
            triggers,
            executions,
            job_poller,
            queue_poller,
            execution_poller,
        }
    }

    /// Spawn the three reconciliation loops on their configured schedules.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        tracing::info!(
            job_interval_secs = self.config.polling.job_interval_secs,
            queue_interval_secs = self.config.polling.queue_interval_secs,
            execution_interval_secs = self.config.polling.execution_interval_secs,
            "starting reconciliation pollers"
        );
        vec![
            self.job_poller.clone().spawn(self.config.polling.job_interval()),
            self.queue_poller
                .clone()
                .spawn(self.config.polling.queue_interval()),
            self.execution_poller
                .clone()
                .spawn(self.config.polling.execution_interval()),
        ]
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
