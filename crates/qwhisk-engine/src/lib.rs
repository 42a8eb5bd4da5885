//! qwhisk core engine.
//!
//! The broker keeps three worlds consistent: quantum-backend jobs, FaaS
//! runtime activations, and the locally registered providers, applications
//! and event triggers.
//!
//! # Overview
//!
//! - [`TriggerEngine`] matches domain events against registered triggers
//!   and fires them on the FaaS runtime
//! - [`ExecutionService`] materializes script executions from activations
//! - [`NotificationDispatcher`] delivers at-most-once job-status
//!   notifications
//! - [`poll`] holds the three background reconciliation loops
//! - [`Broker`] wires everything together from a [`Config`]

pub mod applications;
pub mod config;
pub mod error;
pub mod executions;
pub mod notify;
pub mod orchestrator;
pub mod poll;
pub mod providers;
pub mod triggers;

pub use applications::ApplicationService;
pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use executions::ExecutionService;
pub use notify::{
    HttpSink, InMemorySink, JobNotification, NotificationDispatcher, NotificationSink,
};
pub use orchestrator::Broker;
pub use poll::{ExecutionPoller, JobPoller, QueuePoller};
pub use providers::ProviderService;
pub use triggers::{matches, TriggerEngine};
