//! Quantum-application lifecycle.

use std::sync::Arc;

use serde_json::Value;

use qwhisk_faas::FaasGateway;
use qwhisk_store::Store;
use qwhisk_types::{QuantumApplication, ScriptExecution};

use crate::error::{EngineError, EngineResult};
use crate::executions::ExecutionService;
use crate::triggers::TriggerEngine;

pub struct ApplicationService {
    store: Arc<dyn Store>,
    faas: Arc<dyn FaasGateway>,
    triggers: Arc<TriggerEngine>,
    executions: Arc<ExecutionService>,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn Store>,
        faas: Arc<dyn FaasGateway>,
        triggers: Arc<TriggerEngine>,
        executions: Arc<ExecutionService>,
    ) -> Self {
        Self {
            store,
            faas,
            triggers,
            executions,
        }
    }

    /// Register an application and deploy its action on the provider's
    /// runtime.
    pub async fn create(
        &self,
        name: &str,
        code: &str,
        docker_image: Option<String>,
        notification_address: Option<String>,
        provider_name: &str,
    ) -> EngineResult<QuantumApplication> {
        if self.store.application(name).await?.is_some() {
            return Err(EngineError::conflict("application", name));
        }
        let provider = self
            .store
            .provider(provider_name)
            .await?
            .ok_or_else(|| EngineError::not_found("provider", provider_name))?;

        let application =
            QuantumApplication::new(name, code, docker_image, notification_address, provider_name);
        self.faas.deploy_action(&provider, &application).await?;
        self.store.save_application(&application).await?;
        tracing::info!(application = name, provider = provider_name, "application created");
        Ok(application)
    }

    pub async fn get(&self, name: &str) -> EngineResult<QuantumApplication> {
        self.store
            .application(name)
            .await?
            .ok_or_else(|| EngineError::not_found("application", name))
    }

    pub async fn list(&self) -> EngineResult<Vec<QuantumApplication>> {
        Ok(self.store.applications().await?)
    }

    /// Invoke the application's action directly.
    pub async fn invoke(&self, name: &str, params: &Value) -> EngineResult<ScriptExecution> {
        self.executions.invoke(name, params).await
    }

    /// Delete an application: unregister it from its triggers, drop its
    /// executions and jobs, remove the remote action, then the local row.
    pub async fn delete(&self, name: &str) -> EngineResult<()> {
        let application = self.get(name).await?;
        let provider = self
            .store
            .provider(&application.provider)
            .await?
            .ok_or_else(|| EngineError::not_found("provider", &application.provider))?;

        for trigger in self.store.triggers_by_application(name).await? {
            self.triggers
                .unregister_application(&trigger.name, name)
                .await?;
        }
        for execution in self.store.executions_by_application(name).await? {
            self.store.delete_execution(&execution.id).await?;
        }
        for job in self.store.jobs_by_application(name).await? {
            self.store.delete_job(&job.id).await?;
        }

        self.faas.remove_action(&provider, name).await?;
        self.store.delete_application(name).await?;
        tracing::info!(application = name, "application deleted");
        Ok(())
    }
}
