//! Domain entities for the qwhisk quantum-FaaS broker.
//!
//! qwhisk mirrors two external systems locally: quantum-backend jobs
//! ([`Job`]) and FaaS-runtime activations ([`ScriptExecution`]), plus the
//! registration entities that tie them together ([`Provider`],
//! [`QuantumApplication`], [`EventTrigger`]). All entities are plain serde
//! types; persistence and remote synchronization live in other crates.

mod application;
mod event;
mod execution;
mod id;
mod job;
mod provider;
mod trigger;

pub use application::QuantumApplication;
pub use event::{EventPayload, EventType};
pub use execution::{ExecutionResult, ExecutionStatus, ScriptExecution, redact_api_token};
pub use id::EntityId;
pub use job::{Job, JobStatus, StatusDetails};
pub use provider::Provider;
pub use trigger::{EventTrigger, TriggerKind};
