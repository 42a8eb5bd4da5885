//! Broker configuration.
//!
//! Loaded from a YAML file, with environment-variable overrides (QWHISK_
//! prefix) applied on top. Defaults match the broker's historical fixed
//! schedules: job reconciliation every 10s, queue metrics and execution
//! reconciliation every 60s.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Complete broker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub network: NetworkConfig,
    pub polling: PollingConfig,
    pub store: StoreConfig,
}

/// Quantum backend connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Quantum backend API endpoint.
    pub endpoint: String,

    /// Long-lived API token exchanged for short-lived access tokens.
    pub api_token: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.quantum-computing.ibm.com/api".to_string(),
            api_token: String::new(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

/// Hub/group/project the broker submits and looks up jobs under. Queue
/// telemetry still enumerates every tuple the topology listing exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub hub: String,
    pub group: String,
    pub project: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hub: "ibm-q".to_string(),
            group: "open".to_string(),
            project: "main".to_string(),
        }
    }
}

/// Fixed poller schedules, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub job_interval_secs: u64,
    pub queue_interval_secs: u64,
    pub execution_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            job_interval_secs: 10,
            queue_interval_secs: 60,
            execution_interval_secs: 60,
        }
    }
}

impl PollingConfig {
    pub fn job_interval(&self) -> Duration {
        Duration::from_secs(self.job_interval_secs)
    }

    pub fn queue_interval(&self) -> Duration {
        Duration::from_secs(self.queue_interval_secs)
    }

    pub fn execution_interval(&self) -> Duration {
        Duration::from_secs(self.execution_interval_secs)
    }
}

/// Persistence settings. `path` unset selects the in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EngineError::Decode(format!("reading config: {e}")))?;
        let config: Config = serde_yaml_ng::from_str(&contents)
            .map_err(|e| EngineError::Decode(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides on top of this configuration.
    pub fn merge_env(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("QWHISK_BACKEND_ENDPOINT") {
            self.backend.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var("QWHISK_BACKEND_TOKEN") {
            self.backend.api_token = token;
        }
        if let Ok(path) = std::env::var("QWHISK_STORE_PATH") {
            self.store.path = Some(path);
        }
        if let Ok(secs) = std::env::var("QWHISK_JOB_INTERVAL") {
            if let Ok(val) = secs.parse() {
                self.polling.job_interval_secs = val;
            }
        }
        if let Ok(secs) = std::env::var("QWHISK_QUEUE_INTERVAL") {
            if let Ok(val) = secs.parse() {
                self.polling.queue_interval_secs = val;
            }
        }
        if let Ok(secs) = std::env::var("QWHISK_EXECUTION_INTERVAL") {
            if let Ok(val) = secs.parse() {
                self.polling.execution_interval_secs = val;
            }
        }
        self
    }

    /// Load: file (or defaults) plus environment overrides.
    pub fn load(config_file: Option<&str>) -> EngineResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.backend.endpoint.is_empty() {
            return Err(EngineError::Decode("backend endpoint is empty".into()));
        }
        if self.polling.job_interval_secs == 0
            || self.polling.queue_interval_secs == 0
            || self.polling.execution_interval_secs == 0
        {
            return Err(EngineError::Decode(
                "polling intervals must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.hub, "ibm-q");
        assert_eq!(config.network.group, "open");
        assert_eq!(config.network.project, "main");
        assert_eq!(config.polling.job_interval_secs, 10);
        assert_eq!(config.polling.queue_interval_secs, 60);
        assert_eq!(config.polling.execution_interval_secs, 60);
        assert!(config.store.path.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
backend:
  endpoint: "https://quantum.example.com/api"
  api_token: "t0ken"
polling:
  job_interval_secs: 5
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.backend.endpoint, "https://quantum.example.com/api");
        assert_eq!(config.polling.job_interval_secs, 5);
        // Unspecified sections keep their defaults.
        assert_eq!(config.polling.queue_interval_secs, 60);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.polling.job_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.backend.api_token = "secret".into();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
