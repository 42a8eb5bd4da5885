//! Quantum backend API client.
//!
//! Implements the legacy IBM-Q-shaped REST surface the broker reconciles
//! against: network/topology listing, per-device queue status, per-job
//! detail and result retrieval, and access-token issuance.
//!
//! Token handling is an explicit wrapper: every request goes through
//! [`IbmqClient::ensure_token`], which exchanges the long-lived API token
//! for a short-lived access token whenever the cached one is older than its
//! freshness window. The access token rides along as the `access_token`
//! query parameter.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::backend::QuantumBackend;
use crate::error::{IbmqError, IbmqResult};

/// How long an issued access token is treated as fresh.
const TOKEN_TTL_MINUTES: i64 = 15;

/// Quantum backend API client.
pub struct IbmqClient {
    /// HTTP client.
    client: Client,
    /// API endpoint URL.
    endpoint: String,
    /// Long-lived API token used to mint access tokens.
    api_token: String,
    /// Cached short-lived access token.
    token: RwLock<Option<CachedAccessToken>>,
}

impl fmt::Debug for IbmqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmqClient")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CachedAccessToken {
    id: String,
    expires_at: DateTime<Utc>,
}

impl CachedAccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Access token issued by `POST /users/loginWithToken`.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "apiToken")]
    api_token: &'a str,
}

impl IbmqClient {
    /// Create a new client for the given endpoint and API token.
    pub fn new(endpoint: impl Into<String>, api_token: impl Into<String>) -> IbmqResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token: api_token.into(),
            token: RwLock::new(None),
        })
    }

    /// Return a fresh access token, minting one when the cache is empty or
    /// the freshness window has elapsed.
    async fn ensure_token(&self) -> IbmqResult<String> {
        let now = Utc::now();
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(now) {
                    return Ok(token.id.clone());
                }
            }
        }

        if self.api_token.is_empty() {
            return Err(IbmqError::Auth(
                "no API token configured for the quantum backend".to_string(),
            ));
        }

        let url = format!("{}/users/loginWithToken", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                api_token: &self.api_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "no body".into());
            return Err(IbmqError::Auth(format!(
                "token exchange returned {status}: {body}"
            )));
        }

        let token: AccessTokenResponse = response.json().await?;
        tracing::debug!("Refreshed quantum backend access token");

        let cached = CachedAccessToken {
            id: token.id.clone(),
            expires_at: now + Duration::minutes(TOKEN_TTL_MINUTES),
        };
        *self.token.write().await = Some(cached);
        Ok(token.id)
    }

    /// GET a path with the access token appended, decoding a JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> IbmqResult<T> {
        let token = self.ensure_token().await?;
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("access_token", token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "no body".into());
            return Err(IbmqError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    fn job_path(hub: &str, group: &str, project: &str, suffix: &str) -> String {
        format!("/Network/{hub}/Groups/{group}/Projects/{project}/{suffix}")
    }
}

#[async_trait]
impl QuantumBackend for IbmqClient {
    async fn networks(&self) -> IbmqResult<Vec<Hub>> {
        self.get_json("/Network").await
    }

    async fn queue_status(
        &self,
        hub: &str,
        group: &str,
        project: &str,
        device: &str,
    ) -> IbmqResult<QueueStatus> {
        let path = Self::job_path(hub, group, project, &format!("devices/{device}/queue/status"));
        self.get_json(&path).await
    }

    async fn job(
        &self,
        hub: &str,
        group: &str,
        project: &str,
        job_id: &str,
    ) -> IbmqResult<IbmqJob> {
        let path = Self::job_path(hub, group, project, &format!("Jobs/{job_id}/v/1"));
        match self.get_json(&path).await {
            Err(IbmqError::Api {
                status: s, ..
            }) if s == StatusCode::NOT_FOUND.as_u16() => {
                Err(IbmqError::JobNotFound(job_id.to_string()))
            }
            other => other,
        }
    }

    async fn job_result(
        &self,
        hub: &str,
        group: &str,
        project: &str,
        job_id: &str,
    ) -> IbmqResult<Value> {
        let path = Self::job_path(hub, group, project, &format!("Jobs/{job_id}/resultDownloadUrl"));
        let download: JobDownloadUrl = self.get_json(&path).await?;

        // Follow the download URL; on any fetch or parse failure fall back
        // to reporting the URL itself.
        match self.client.get(&download.url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        tracing::warn!("Job result at {} was not JSON: {e}", download.url);
                        Ok(json!({ "url": download.url }))
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(
                    "Job result download returned {}: falling back to URL",
                    response.status()
                );
                Ok(json!({ "url": download.url }))
            }
            Err(e) => {
                tracing::warn!("Job result download failed: {e}");
                Ok(json!({ "url": download.url }))
            }
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

/// One hub in the network listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Hub {
    pub name: String,
    #[serde(default)]
    pub groups: HashMap<String, Group>,
}

/// One group inside a hub.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub projects: HashMap<String, Project>,
}

/// One project inside a group.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub devices: HashMap<String, Device>,
}

/// One device inside a project.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub name: String,
}

/// Queue status of one device.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    /// Current queue length.
    #[serde(rename = "lengthQueue", default)]
    pub length_queue: u32,
    /// Backend state string, e.g. "active".
    #[serde(default)]
    pub state: Option<String>,
}

/// Job detail record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbmqJob {
    #[serde(default)]
    pub id: Option<String>,
    /// Current status as reported, e.g. "QUEUED".
    pub status: String,
    /// Timestamp every pipeline step was reached at, keyed by status name.
    #[serde(default)]
    pub time_per_step: HashMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary_data: Option<SummaryData>,
}

/// Success summary of a completed job.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryData {
    #[serde(default)]
    pub success: Option<bool>,
}

/// Result-download pointer.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDownloadUrl {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_status_deserialization() {
        let json = r#"{"lengthQueue": 17, "state": "active"}"#;
        let status: QueueStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.length_queue, 17);
        assert_eq!(status.state.as_deref(), Some("active"));
    }

    #[test]
    fn test_job_deserialization() {
        let json = r#"{
            "id": "job-1",
            "status": "COMPLETED",
            "timePerStep": {
                "CREATING": "2023-03-01T10:00:00Z",
                "COMPLETED": "2023-03-01T10:05:00Z"
            },
            "creationDate": "2023-03-01T10:00:00Z",
            "endDate": "2023-03-01T10:05:00Z",
            "summaryData": {"success": true}
        }"#;
        let job: IbmqJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.status, "COMPLETED");
        assert_eq!(job.time_per_step.len(), 2);
        assert_eq!(job.summary_data.unwrap().success, Some(true));
    }

    #[test]
    fn test_job_tolerates_missing_fields() {
        let job: IbmqJob = serde_json::from_str(r#"{"status": "QUEUED"}"#).unwrap();
        assert_eq!(job.status, "QUEUED");
        assert!(job.time_per_step.is_empty());
        assert!(job.summary_data.is_none());
    }

    #[test]
    fn test_cached_token_freshness() {
        let now = Utc::now();
        let fresh = CachedAccessToken {
            id: "t".to_string(),
            expires_at: now + Duration::minutes(5),
        };
        assert!(fresh.is_fresh(now));

        let stale = CachedAccessToken {
            id: "t".to_string(),
            expires_at: now - Duration::seconds(1),
        };
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn test_debug_redacts_api_token() {
        let client = IbmqClient::new("https://api.example.com", "secret-token").unwrap();
        let dbg = format!("{client:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("secret-token"));
    }
}
