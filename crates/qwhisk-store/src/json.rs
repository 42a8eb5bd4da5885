//! JSON file-based store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::RwLock;

use qwhisk_types::{
    EntityId, EventTrigger, ExecutionStatus, Job, Provider, QuantumApplication, ScriptExecution,
};

use crate::{Store, StoreResult};

const PROVIDERS: &str = "providers";
const APPLICATIONS: &str = "applications";
const TRIGGERS: &str = "triggers";
const JOBS: &str = "jobs";
const EXECUTIONS: &str = "executions";

#[derive(Default)]
struct Cache {
    providers: FxHashMap<String, Provider>,
    applications: FxHashMap<String, QuantumApplication>,
    triggers: FxHashMap<String, EventTrigger>,
    jobs: FxHashMap<EntityId, Job>,
    executions: FxHashMap<EntityId, ScriptExecution>,
}

/// Store persisting one JSON file per entity under per-type directories.
///
/// All reads are served from a write-through in-memory cache populated at
/// startup. Suitable for development and single-node deployments.
pub struct JsonStore {
    base_dir: PathBuf,
    cache: RwLock<Cache>,
}

impl JsonStore {
    /// Open (or create) a store rooted at the given directory.
    pub async fn new(base_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        for dir in [PROVIDERS, APPLICATIONS, TRIGGERS, JOBS, EXECUTIONS] {
            fs::create_dir_all(base_dir.join(dir)).await?;
        }

        let store = Self {
            base_dir,
            cache: RwLock::new(Cache::default()),
        };
        store.load_all().await?;
        Ok(store)
    }

    /// Create a store in a fresh temporary directory.
    pub async fn temp() -> StoreResult<Self> {
        let dir = std::env::temp_dir().join(format!("qwhisk-store-{}", uuid_suffix()));
        Self::new(dir).await
    }

    async fn load_all(&self) -> StoreResult<()> {
        let mut cache = self.cache.write().await;
        for p in self.load_dir::<Provider>(PROVIDERS).await? {
            cache.providers.insert(p.name.clone(), p);
        }
        for a in self.load_dir::<QuantumApplication>(APPLICATIONS).await? {
            cache.applications.insert(a.name.clone(), a);
        }
        for t in self.load_dir::<EventTrigger>(TRIGGERS).await? {
            cache.triggers.insert(t.name.clone(), t);
        }
        for j in self.load_dir::<Job>(JOBS).await? {
            cache.jobs.insert(j.id, j);
        }
        for e in self.load_dir::<ScriptExecution>(EXECUTIONS).await? {
            cache.executions.insert(e.id, e);
        }
        Ok(())
    }

    async fn load_dir<T: DeserializeOwned>(&self, dir: &str) -> StoreResult<Vec<T>> {
        let mut out = Vec::new();
        let mut entries = fs::read_dir(self.base_dir.join(dir)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match fs::read_to_string(&path).await {
                    Ok(content) => match serde_json::from_str::<T>(&content) {
                        Ok(entity) => out.push(entity),
                        Err(e) => {
                            tracing::warn!("Skipping corrupt entity file {path:?}: {e}");
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to read entity file {path:?}: {e}");
                    }
                }
            }
        }
        Ok(out)
    }

    fn entity_path(&self, dir: &str, id: EntityId) -> PathBuf {
        self.base_dir.join(dir).join(format!("{id}.json"))
    }

    async fn write_entity<T: Serialize>(&self, dir: &str, id: EntityId, entity: &T) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(entity)?;
        fs::write(self.entity_path(dir, id), json).await?;
        Ok(())
    }

    async fn remove_entity(&self, dir: &str, id: EntityId) -> StoreResult<()> {
        let path = self.entity_path(dir, id);
        if fs::try_exists(&path).await? {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

fn uuid_suffix() -> String {
    qwhisk_types::EntityId::new().to_string()
}

#[async_trait]
impl Store for JsonStore {
    async fn save_provider(&self, provider: &Provider) -> StoreResult<()> {
        self.write_entity(PROVIDERS, provider.id, provider).await?;
        self.cache
            .write()
            .await
            .providers
            .insert(provider.name.clone(), provider.clone());
        Ok(())
    }

    async fn provider(&self, name: &str) -> StoreResult<Option<Provider>> {
        Ok(self.cache.read().await.providers.get(name).cloned())
    }

    async fn delete_provider(&self, name: &str) -> StoreResult<bool> {
        let removed = self.cache.write().await.providers.remove(name);
        match removed {
            Some(provider) => {
                self.remove_entity(PROVIDERS, provider.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn providers(&self) -> StoreResult<Vec<Provider>> {
        Ok(self.cache.read().await.providers.values().cloned().collect())
    }

    async fn save_application(&self, application: &QuantumApplication) -> StoreResult<()> {
        self.write_entity(APPLICATIONS, application.id, application)
            .await?;
        self.cache
            .write()
            .await
            .applications
            .insert(application.name.clone(), application.clone());
        Ok(())
    }

    async fn application(&self, name: &str) -> StoreResult<Option<QuantumApplication>> {
        Ok(self.cache.read().await.applications.get(name).cloned())
    }

    async fn delete_application(&self, name: &str) -> StoreResult<bool> {
        let removed = self.cache.write().await.applications.remove(name);
        match removed {
            Some(application) => {
                self.remove_entity(APPLICATIONS, application.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn applications(&self) -> StoreResult<Vec<QuantumApplication>> {
        Ok(self
            .cache
            .read()
            .await
            .applications
            .values()
            .cloned()
            .collect())
    }

    async fn applications_by_provider(
        &self,
        provider: &str,
    ) -> StoreResult<Vec<QuantumApplication>> {
        Ok(self
            .cache
            .read()
            .await
            .applications
            .values()
            .filter(|a| a.provider == provider)
            .cloned()
            .collect())
    }

    async fn save_trigger(&self, trigger: &EventTrigger) -> StoreResult<()> {
        self.write_entity(TRIGGERS, trigger.id, trigger).await?;
        self.cache
            .write()
            .await
            .triggers
            .insert(trigger.name.clone(), trigger.clone());
        Ok(())
    }

    async fn trigger(&self, name: &str) -> StoreResult<Option<EventTrigger>> {
        Ok(self.cache.read().await.triggers.get(name).cloned())
    }

    async fn delete_trigger(&self, name: &str) -> StoreResult<bool> {
        let removed = self.cache.write().await.triggers.remove(name);
        match removed {
            Some(trigger) => {
                self.remove_entity(TRIGGERS, trigger.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn triggers(&self) -> StoreResult<Vec<EventTrigger>> {
        Ok(self.cache.read().await.triggers.values().cloned().collect())
    }

    async fn triggers_by_provider(&self, provider: &str) -> StoreResult<Vec<EventTrigger>> {
        Ok(self
            .cache
            .read()
            .await
            .triggers
            .values()
            .filter(|t| t.provider == provider)
            .cloned()
            .collect())
    }

    async fn triggers_by_application(&self, application: &str) -> StoreResult<Vec<EventTrigger>> {
        Ok(self
            .cache
            .read()
            .await
            .triggers
            .values()
            .filter(|t| t.applications.iter().any(|a| a == application))
            .cloned()
            .collect())
    }

    async fn save_job(&self, job: &Job) -> StoreResult<()> {
        self.write_entity(JOBS, job.id, job).await?;
        self.cache.write().await.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn job(&self, id: &EntityId) -> StoreResult<Option<Job>> {
        Ok(self.cache.read().await.jobs.get(id).cloned())
    }

    async fn delete_job(&self, id: &EntityId) -> StoreResult<bool> {
        let removed = self.cache.write().await.jobs.remove(id);
        match removed {
            Some(job) => {
                self.remove_entity(JOBS, job.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self.cache.read().await.jobs.values().cloned().collect())
    }

    async fn active_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self
            .cache
            .read()
            .await
            .jobs
            .values()
            .filter(|j| !j.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn jobs_by_application(&self, application: &str) -> StoreResult<Vec<Job>> {
        Ok(self
            .cache
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.application == application)
            .cloned()
            .collect())
    }

    async fn save_execution(&self, execution: &ScriptExecution) -> StoreResult<()> {
        self.write_entity(EXECUTIONS, execution.id, execution).await?;
        self.cache
            .write()
            .await
            .executions
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn execution(&self, id: &EntityId) -> StoreResult<Option<ScriptExecution>> {
        Ok(self.cache.read().await.executions.get(id).cloned())
    }

    async fn delete_execution(&self, id: &EntityId) -> StoreResult<bool> {
        let removed = self.cache.write().await.executions.remove(id);
        match removed {
            Some(execution) => {
                self.remove_entity(EXECUTIONS, execution.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn executions(&self) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self
            .cache
            .read()
            .await
            .executions
            .values()
            .cloned()
            .collect())
    }

    async fn executions_by_status(
        &self,
        status: ExecutionStatus,
    ) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self
            .cache
            .read()
            .await
            .executions
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }

    async fn executions_by_provider(&self, provider: &str) -> StoreResult<Vec<ScriptExecution>> {
        Ok(self
            .cache
            .read()
            .await
            .executions
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
            .cache
            .read()
            .await
            .executions
            .values()
            .filter(|e| e.application == application)
            .cloned()
            .collect())
    }
}
