//! Domain state store for qwhisk.
//!
//! One [`Store`] trait covers all five entity types; the engine and the
//! pollers only ever talk to `Arc<dyn Store>`. Two implementations ship:
//! [`MemoryStore`] for tests and single-node runs, and [`JsonStore`] which
//! persists one JSON file per entity.
//!
//! Uniqueness of names is enforced by the services before saving; the store
//! itself is a plain keyed overwrite.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use qwhisk_types::{
    EntityId, EventTrigger, ExecutionStatus, Job, Provider, QuantumApplication, ScriptExecution,
};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error while reading or writing persisted state.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error for a persisted entity.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent domain state.
///
/// Providers, applications and triggers are keyed by their unique names;
/// jobs and script executions by their local [`EntityId`]. Delete operations
/// return whether the entity existed.
#[async_trait]
pub trait Store: Send + Sync {
    // Providers
    async fn save_provider(&self, provider: &Provider) -> StoreResult<()>;
    async fn provider(&self, name: &str) -> StoreResult<Option<Provider>>;
    async fn delete_provider(&self, name: &str) -> StoreResult<bool>;
    async fn providers(&self) -> StoreResult<Vec<Provider>>;

    // Quantum applications
    async fn save_application(&self, application: &QuantumApplication) -> StoreResult<()>;
    async fn application(&self, name: &str) -> StoreResult<Option<QuantumApplication>>;
    async fn delete_application(&self, name: &str) -> StoreResult<bool>;
    async fn applications(&self) -> StoreResult<Vec<QuantumApplication>>;
    async fn applications_by_provider(
        &self,
        provider: &str,
    ) -> StoreResult<Vec<QuantumApplication>>;

    // Event triggers
    async fn save_trigger(&self, trigger: &EventTrigger) -> StoreResult<()>;
    async fn trigger(&self, name: &str) -> StoreResult<Option<EventTrigger>>;
    async fn delete_trigger(&self, name: &str) -> StoreResult<bool>;
    async fn triggers(&self) -> StoreResult<Vec<EventTrigger>>;
    async fn triggers_by_provider(&self, provider: &str) -> StoreResult<Vec<EventTrigger>>;
    async fn triggers_by_application(&self, application: &str) -> StoreResult<Vec<EventTrigger>>;

    // Jobs
    async fn save_job(&self, job: &Job) -> StoreResult<()>;
    async fn job(&self, id: &EntityId) -> StoreResult<Option<Job>>;
    async fn delete_job(&self, id: &EntityId) -> StoreResult<bool>;
    async fn jobs(&self) -> StoreResult<Vec<Job>>;
    /// Jobs whose status is not yet terminal; the job poller's working set.
    async fn active_jobs(&self) -> StoreResult<Vec<Job>>;
    async fn jobs_by_application(&self, application: &str) -> StoreResult<Vec<Job>>;

    // Script executions
    async fn save_execution(&self, execution: &ScriptExecution) -> StoreResult<()>;
    async fn execution(&self, id: &EntityId) -> StoreResult<Option<ScriptExecution>>;
    async fn delete_execution(&self, id: &EntityId) -> StoreResult<bool>;
    async fn executions(&self) -> StoreResult<Vec<ScriptExecution>>;
    async fn executions_by_status(
        &self,
        status: ExecutionStatus,
    ) -> StoreResult<Vec<ScriptExecution>>;
    async fn executions_by_provider(&self, provider: &str) -> StoreResult<Vec<ScriptExecution>>;
    async fn executions_by_application(
        &self,
        application: &str,
    ) -> StoreResult<Vec<ScriptExecution>>;
}
