//! Event triggers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntityId, EventType};

/// The trigger variants, discriminated by the `eventType` tag.
///
/// One persisted identity covers all variants; matching and firing switch on
/// the tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum TriggerKind {
    /// Fires only when addressed by name.
    #[serde(rename = "BASIC")]
    Basic,

    /// Fires when a tracked device's queue length reaches the threshold.
    #[serde(rename = "QUEUE_SIZE", rename_all = "camelCase")]
    QueueSize {
        /// Minimum queue length that fires the trigger.
        size_threshold: u32,
        /// Devices whose queues are watched.
        tracked_devices: Vec<String>,
        /// Re-arm delay in minutes. `None` makes the trigger single-shot:
        /// it is deleted right after its first firing.
        trigger_delay: Option<i64>,
        /// Suppression window; the trigger does not match before this time.
        disabled_until: DateTime<Utc>,
    },

    /// Fires when the named application's result becomes available.
    #[serde(rename = "EXECUTION_RESULT", rename_all = "camelCase")]
    ExecutionResult { application_name: String },
}

impl TriggerKind {
    pub fn event_type(&self) -> EventType {
        match self {
            TriggerKind::Basic => EventType::Basic,
            TriggerKind::QueueSize { .. } => EventType::QueueSize,
            TriggerKind::ExecutionResult { .. } => EventType::ExecutionResult,
        }
    }
}

/// A registered event trigger.
///
/// Each trigger mirrors a trigger object on its provider's FaaS runtime;
/// every registered application adds one rule linking the runtime trigger to
/// that application's action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    pub id: EntityId,
    /// Unique trigger name; doubles as the remote trigger name.
    pub name: String,
    /// Owning provider name.
    pub provider: String,
    /// Names of the applications registered to this trigger.
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(flatten)]
    pub kind: TriggerKind,
}

impl EventTrigger {
    pub fn new(name: impl Into<String>, provider: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            provider: provider.into(),
            applications: Vec::new(),
            kind,
        }
    }

    /// A queue-size trigger armed immediately.
    pub fn queue_size(
        name: impl Into<String>,
        provider: impl Into<String>,
        size_threshold: u32,
        tracked_devices: Vec<String>,
        trigger_delay: Option<i64>,
    ) -> Self {
        Self::new(
            name,
            provider,
            TriggerKind::QueueSize {
                size_threshold,
                tracked_devices,
                trigger_delay,
                disabled_until: Utc::now(),
            },
        )
    }

    pub fn execution_result(
        name: impl Into<String>,
        provider: impl Into<String>,
        application_name: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            provider,
            TriggerKind::ExecutionResult {
                application_name: application_name.into(),
            },
        )
    }

    pub fn basic(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::new(name, provider, TriggerKind::Basic)
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Whether this trigger self-deletes after firing once.
    pub fn is_single_shot(&self) -> bool {
        matches!(
            self.kind,
            TriggerKind::QueueSize {
                trigger_delay: None,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tag_on_the_wire() {
        let trigger = EventTrigger::queue_size("qs", "ow", 5, vec!["ibmq_lima".into()], Some(10));
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["eventType"], "QUEUE_SIZE");
        assert_eq!(json["sizeThreshold"], 5);

        let back: EventTrigger = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type(), EventType::QueueSize);
    }

    #[test]
    fn test_single_shot() {
        let one_shot = EventTrigger::queue_size("a", "ow", 5, vec![], None);
        assert!(one_shot.is_single_shot());

        let rearming = EventTrigger::queue_size("b", "ow", 5, vec![], Some(15));
        assert!(!rearming.is_single_shot());

        assert!(!EventTrigger::basic("c", "ow").is_single_shot());
    }
}
