//! Background reconciliation pollers.
//!
//! Three independent fixed-interval loops: job status against the quantum
//! backend, device queue depths feeding the trigger engine, and running
//! script executions against the FaaS runtime. Each poller exposes a
//! unit-testable `poll_once` and a `spawn` that runs it on a ticker.

mod execution;
mod job;
mod queue;

pub use execution::ExecutionPoller;
pub use job::JobPoller;
pub use queue::QueuePoller;
