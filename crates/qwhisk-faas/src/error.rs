//! Error types for the FaaS runtime client.

use thiserror::Error;

/// Result type for FaaS runtime operations.
pub type FaasResult<T> = Result<T, FaasError>;

/// Errors that can occur when talking to the FaaS runtime.
#[derive(Debug, Error)]
pub enum FaasError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The runtime returned an unexpected status.
    #[error("FaaS runtime API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Firing a trigger yielded no activation id. The trigger has no
    /// active rules linking it to any action.
    #[error("Trigger '{trigger}' returned no activation id; it may have no active rules")]
    NoActivation {
        /// Name of the fired trigger.
        trigger: String,
    },

    /// The provider's stored credential is not a valid header value.
    #[error("Invalid basic-auth credential for provider '{0}'")]
    InvalidCredentials(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
