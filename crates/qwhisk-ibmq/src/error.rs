//! Error types for the quantum backend client.

use thiserror::Error;

/// Result type for quantum backend operations.
pub type IbmqResult<T> = Result<T, IbmqError>;

/// Errors that can occur when talking to the quantum backend.
#[derive(Debug, Error)]
pub enum IbmqError {
    /// No API token configured, or the token exchange was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an unexpected status.
    #[error("Quantum backend API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Job not found on the backend.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IbmqError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Quantum backend API error (500): boom");

        let err = IbmqError::JobNotFound("j-42".to_string());
        assert_eq!(err.to_string(), "Job not found: j-42");
    }
}
