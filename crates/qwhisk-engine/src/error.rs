//! Engine error types.

use thiserror::Error;

/// Errors raised by the qwhisk engine services.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique name is already taken. Raised before any side effect.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Trigger and application belong to different provider namespaces.
    #[error("namespace mismatch: trigger belongs to {trigger_namespace}, application to {application_namespace}")]
    NamespaceMismatch {
        trigger_namespace: String,
        application_namespace: String,
    },

    /// The quantum backend rejected or failed a call.
    #[error("quantum backend error: {0}")]
    Backend(#[from] qwhisk_ibmq::IbmqError),

    /// The FaaS runtime rejected or failed a call.
    #[error("faas runtime error: {0}")]
    Faas(#[from] qwhisk_faas::FaasError),

    /// A remote payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] qwhisk_store::StoreError),

    /// A notification could not be delivered.
    #[error("notification error: {0}")]
    Notify(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(kind: &str, name: impl std::fmt::Display) -> Self {
        EngineError::NotFound(format!("{kind} '{name}'"))
    }

    pub fn conflict(kind: &str, name: impl std::fmt::Display) -> Self {
        EngineError::Conflict(format!("{kind} '{name}' already exists"))
    }
}
