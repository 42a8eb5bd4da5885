//! Quantum backend REST client for qwhisk.
//!
//! The broker never talks to quantum hardware directly; it reconciles local
//! [`Job`](qwhisk_types::Job) mirrors against this client's read-only view
//! of the backend: topology, device queues, job details and results.
//! Access-token refresh is explicit and happens before every call.

mod api;
mod backend;
mod error;

pub use api::{Device, Group, Hub, IbmqClient, IbmqJob, JobDownloadUrl, Project, QueueStatus, SummaryData};
pub use backend::{device_tuples, DeviceRef, QuantumBackend};
pub use error::{IbmqError, IbmqResult};
