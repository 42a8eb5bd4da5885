//! Domain events fed into the trigger engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of domain event a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "QUEUE_SIZE")]
    QueueSize,
    #[serde(rename = "EXECUTION_RESULT")]
    ExecutionResult,
    #[serde(rename = "BASIC")]
    Basic,
}

/// A domain event: a type tag plus two flat property bags.
///
/// `properties` is forwarded verbatim as the invocation input of every
/// trigger the event fires; `attributes` is only consulted by the matching
/// rules and never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub event_type: EventType,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EventPayload {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            properties: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Queue-depth telemetry for one device.
    pub fn queue_size(device: impl Into<String>, queue_size: u32) -> Self {
        Self::new(EventType::QueueSize)
            .with_property("device", device.into())
            .with_attribute("queueSize", queue_size)
    }

    /// A completed job result for one application.
    pub fn execution_result(
        application: impl Into<String>,
        device: impl Into<String>,
        result: Value,
    ) -> Self {
        Self::new(EventType::ExecutionResult)
            .with_attribute("quantumApplicationName", application.into())
            .with_property("device", device.into())
            .with_property("result", result)
    }

    /// An event addressed to a single trigger by name.
    pub fn basic(trigger_name: impl Into<String>) -> Self {
        Self::new(EventType::Basic).with_attribute("triggerName", trigger_name.into())
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute lookup as a string slice.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Property lookup as a string slice.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Attribute lookup as an unsigned integer.
    pub fn attribute_u64(&self, key: &str) -> Option<u64> {
        self.attributes.get(key).and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_size_payload() {
        let payload = EventPayload::queue_size("ibmq_lima", 12);
        assert_eq!(payload.event_type, EventType::QueueSize);
        assert_eq!(payload.property_str("device"), Some("ibmq_lima"));
        assert_eq!(payload.attribute_u64("queueSize"), Some(12));
    }

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::QueueSize).unwrap();
        assert_eq!(json, "\"QUEUE_SIZE\"");
        let parsed: EventType = serde_json::from_str("\"EXECUTION_RESULT\"").unwrap();
        assert_eq!(parsed, EventType::ExecutionResult);
    }
}
