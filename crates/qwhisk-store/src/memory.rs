//! In-memory store.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use qwhisk_types::{
    EntityId, EventTrigger, ExecutionStatus, Job, Provider, QuantumApplication, ScriptExecution,
};

use crate::{Store, StoreResult};

/// Store keeping everything in process memory.
///
/// Suitable for tests and single-node deployments where durability is not
/// required.
#[derive(Default)]
pub struct MemoryStore {
    providers: RwLock<FxHashMap<String, Provider>>,
    applications: RwLock<FxHashMap<String, QuantumApplication>>,
    triggers: RwLock<FxHashMap<String, EventTrigger>>,
    jobs: RwLock<FxHashMap<EntityId, Job>>,
    executions: RwLock<FxHashMap<EntityId, ScriptExecution>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_provider(&self, provider: &Provider) -> StoreResult<()> {
        self.providers
            .write()
            .await
            .insert(provider.name.clone(), provider.clone());
        Ok(())
    }

    async fn provider(&self, name: &str) -> StoreResult<Option<Provider>> {
        Ok(self.providers.read().await.get(name).cloned())
    }

    async fn delete_provider(&self, name: &str) -> StoreResult<bool> {
        Ok(self.providers.write().await.remove(name).is_some())
    }

    async fn providers(&self) -> StoreResult<Vec<Provider>> {
        Ok(self.providers.read().await.values().cloned().collect())
    }

    async fn save_application(&self, application: &QuantumApplication) -> StoreResult<()> {
        self.applications
            .write()
            .await
            .insert(application.name.clone(), application.clone());
        Ok(())
    }

    async fn application(&self, name: &str) -> StoreResult<Option<QuantumApplication>> {
        Ok(self.applications.read().await.get(name).cloned())
    }

    async fn delete_application(&self, name: &str) -> StoreResult<bool> {
        Ok(self.applications.write().await.remove(name).is_some())
    }

    async fn applications(&self) -> StoreResult<Vec<QuantumApplication>> {
        Ok(self.applications.read().await.values().cloned().collect())
    }

    async fn applications_by_provider(
        &self,
        provider: &str,
    ) -> StoreResult<Vec<QuantumApplication>> {
        Ok(self
            .applications
            .read()
            .await
            .values()
            .filter(|a| a.provider == provider)
            .cloned()
            .collect())
    }

    async fn save_trigger(&self, trigger: &EventTrigger) -> StoreResult<()> {
        self.triggers
            .write()
            .await
            .insert(trigger.name.clone(), trigger.clone());
        Ok(())
    }

    async fn trigger(&self, name: &str) -> StoreResult<Option<EventTrigger>> {
        Ok(self.triggers.read().await.get(name).cloned())
    }

    async fn delete_trigger(&self, name: &str) -> StoreResult<bool> {
        Ok(self.triggers.write().await.remove(name).is_some())
    }

    async fn triggers(&self) -> StoreResult<Vec<EventTrigger>> {
        Ok(self.triggers.read().await.values().cloned().collect())
    }

    async fn triggers_by_provider(&self, provider: &str) -> StoreResult<Vec<EventTrigger>> {
        Ok(self
            .triggers
            .read()
            .await
            .values()
            .filter(|t| t.provider == provider)
            .cloned()
            .collect())
    }

    async fn triggers_by_application(&self, application: &str) -> StoreResult<Vec<EventTrigger>> {
        Ok(self
            .triggers
            .read()
            .await
            .values()
            .filter(|t| t.applications.iter().any(|a| a == application))
            .cloned()
            .collect())
    }

    async fn save_job(&self, job: &Job) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn job(&self, id: &EntityId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn delete_job(&self, id: &EntityId) -> StoreResult<bool> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }

    async fn jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }

    async fn active_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| !j.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn jobs_by_application(&self, application: &str) -> StoreResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.application == application)
            .cloned()
            .collect())
    }

    async fn save_execution(&self, execution: &ScriptExecution) -> StoreResult<()> {
        self.executions
            .write()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn execution(&self, id: &EntityId) -> StoreResult<Option<ScriptExecution>> {
        Ok(self.executions.read().await.get(id).cloned())
    }

    async fn delete_execution(&self, id: &EntityId) -> StoreResult<bool> {
        Ok(self.executions.write().await.remove(id).is_some())
    }

    async fn executions(&self) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self.executions.read().await.values().cloned().collect())
    }

    async fn executions_by_status(
        &self,
        status: ExecutionStatus,
    ) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self
            .executions
            .read()
            .await
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }

    async fn executions_by_provider(&self, provider: &str) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self
            .executions
            .read()
            .await
            .values()
            .filter(|e| e.provider == provider)
            .cloned()
            .collect())
    }

    async fn executions_by_application(
        &self,
        application: &str,
    ) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self
            .executions
            .read()
            .await
            .values()
            .filter(|e| e.application == application)
            .cloned()
            .collect())
    }
}
