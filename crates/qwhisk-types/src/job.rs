//! Quantum-backend job mirrors.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EntityId;

/// Lifecycle of a job on the quantum backend.
///
/// Statuses form an ordered pipeline; `Failed` is terminal from any state,
/// `Completed` is the terminal success state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Creating,
    Created,
    Validating,
    Validated,
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// All statuses in ascending pipeline order.
    pub const PIPELINE: [JobStatus; 8] = [
        JobStatus::Creating,
        JobStatus::Created,
        JobStatus::Validating,
        JobStatus::Validated,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The wire name the quantum backend reports, e.g. `"COMPLETED"`.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Creating => "CREATING",
            JobStatus::Created => "CREATED",
            JobStatus::Validating => "VALIDATING",
            JobStatus::Validated => "VALIDATED",
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATING" => Ok(JobStatus::Creating),
            "CREATED" => Ok(JobStatus::Created),
            "VALIDATING" => Ok(JobStatus::Validating),
            "VALIDATED" => Ok(JobStatus::Validated),
            "QUEUED" => Ok(JobStatus::Queued),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-status bookkeeping: when the status was reached and whether its
/// notification already went out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    pub reached_at: DateTime<Utc>,
    /// Flips false→true at most once and never back.
    pub notification_sent: bool,
}

impl StatusDetails {
    pub fn reached(at: DateTime<Utc>) -> Self {
        Self {
            reached_at: at,
            notification_sent: false,
        }
    }
}

/// Local mirror of one quantum-backend execution.
///
/// Created by the execution poller when an activation succeeds; mutated only
/// by the job poller afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: EntityId,
    /// Job id on the quantum backend.
    pub backend_job_id: String,
    pub status: JobStatus,
    /// Every status observed so far, with notification bookkeeping.
    #[serde(default)]
    pub status_details: HashMap<JobStatus, StatusDetails>,
    /// Result payload; present only once `Completed`.
    pub result: Option<Value>,
    pub device: String,
    pub input_params: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    /// Owning application name.
    pub application: String,
}

impl Job {
    /// A freshly spawned job in `Creating`, not yet seen by the backend
    /// pollers.
    pub fn spawned(
        backend_job_id: impl Into<String>,
        device: impl Into<String>,
        input_params: Option<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            backend_job_id: backend_job_id.into(),
            status: JobStatus::Creating,
            status_details: HashMap::new(),
            result: None,
            device: device.into(),
            input_params,
            creation_date: None,
            end_date: None,
            success: None,
            application: application.into(),
        }
    }

    /// Merge the backend's per-step timestamp map.
    ///
    /// Only statuses not yet recorded are inserted, so an already-sent
    /// notification flag is never reset by a later poll.
    pub fn record_steps(&mut self, time_per_step: &HashMap<String, DateTime<Utc>>) {
        for (name, reached_at) in time_per_step {
            let Ok(status) = name.parse::<JobStatus>() else {
                continue;
            };
            self.status_details
                .entry(status)
                .or_insert_with(|| StatusDetails::reached(*reached_at));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        assert!(JobStatus::Creating < JobStatus::Queued);
        assert!(JobStatus::Running < JobStatus::Completed);
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_record_steps_preserves_sent_flag() {
        let mut job = Job::spawned("backend-1", "ibmq_lima", None, "shor");
        let mut steps = HashMap::new();
        steps.insert("CREATING".to_string(), Utc::now());
        job.record_steps(&steps);
        job.status_details
            .get_mut(&JobStatus::Creating)
            .unwrap()
            .notification_sent = true;

        // A later poll reports the same step again plus a new one.
        steps.insert("QUEUED".to_string(), Utc::now());
        job.record_steps(&steps);

        assert!(job.status_details[&JobStatus::Creating].notification_sent);
        assert!(!job.status_details[&JobStatus::Queued].notification_sent);
    }

    #[test]
    fn test_record_steps_skips_unknown_status() {
        let mut job = Job::spawned("backend-1", "ibmq_lima", None, "shor");
        let mut steps = HashMap::new();
        steps.insert("TRANSMOGRIFYING".to_string(), Utc::now());
        job.record_steps(&steps);
        assert!(job.status_details.is_empty());
    }
}
