//! The backend trait and topology helpers.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{Hub, IbmqJob, QueueStatus};
use crate::error::IbmqResult;

/// One device reachable through the backend's network listing, together
/// with the hub/group/project path addressing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRef {
    pub hub: String,
    pub group: String,
    pub project: String,
    pub device: String,
}

/// Flatten the network listing into addressable device tuples.
pub fn device_tuples(hubs: &[Hub]) -> Vec<DeviceRef> {
    let mut out = Vec::new();
    for hub in hubs {
        for group in hub.groups.values() {
            for project in group.projects.values() {
                for device in project.devices.values() {
                    out.push(DeviceRef {
                        hub: hub.name.clone(),
                        group: group.name.clone(),
                        project: project.name.clone(),
                        device: device.name.clone(),
                    });
                }
            }
        }
    }
    out
}

/// Read access to the quantum backend's REST API.
///
/// The pollers only depend on this trait; [`crate::IbmqClient`] is the HTTP
/// implementation, tests substitute mocks.
#[async_trait]
pub trait QuantumBackend: Send + Sync {
    /// The hub/group/project/device topology listing.
    async fn networks(&self) -> IbmqResult<Vec<Hub>>;

    /// Queue status of one device.
    async fn queue_status(
        &self,
        hub: &str,
        group: &str,
        project: &str,
        device: &str,
    ) -> IbmqResult<QueueStatus>;

    /// Detail record of one job.
    async fn job(
        &self,
        hub: &str,
        group: &str,
        project: &str,
        job_id: &str,
    ) -> IbmqResult<IbmqJob>;

    /// Result payload of a completed job.
    async fn job_result(
        &self,
        hub: &str,
        group: &str,
        project: &str,
        job_id: &str,
    ) -> IbmqResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_tuples_flattening() {
        let json = r#"[{
            "name": "ibm-q",
            "groups": {
                "open": {
                    "name": "open",
                    "projects": {
                        "main": {
                            "name": "main",
                            "devices": {
                                "ibmq_lima": {"name": "ibmq_lima"},
                                "ibmq_quito": {"name": "ibmq_quito"}
                            }
                        }
                    }
                }
            }
        }]"#;
        let hubs: Vec<Hub> = serde_json::from_str(json).unwrap();
        let mut tuples = device_tuples(&hubs);
        tuples.sort_by(|a, b| a.device.cmp(&b.device));

        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].hub, "ibm-q");
        assert_eq!(tuples[0].group, "open");
        assert_eq!(tuples[0].project, "main");
        assert_eq!(tuples[0].device, "ibmq_lima");
    }
}
