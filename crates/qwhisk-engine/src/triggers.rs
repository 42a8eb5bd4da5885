//! Event-trigger engine.
//!
//! Triggers mirror trigger objects on their provider's FaaS runtime. `emit`
//! matches a domain event against the registered triggers and fires every
//! match; `fire` pushes the event to the runtime and materializes the
//! resulting action activations as script executions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use qwhisk_faas::FaasGateway;
use qwhisk_store::Store;
use qwhisk_types::{EventPayload, EventTrigger, Provider, ScriptExecution, TriggerKind};

use crate::error::{EngineError, EngineResult};
use crate::executions::ExecutionService;

/// Whether `trigger` matches `payload` at instant `now`.
///
/// The trigger's event type must equal the payload's; attributes are only
/// consulted after that gate. Queue-size triggers match when the reported
/// queue length reaches their threshold, the reported device is tracked,
/// and the suppression window has passed. Execution-result triggers match
/// on application name; basic triggers only on their own name.
pub fn matches(trigger: &EventTrigger, payload: &EventPayload, now: DateTime<Utc>) -> bool {
    if trigger.event_type() != payload.event_type {
        return false;
    }
    match &trigger.kind {
        TriggerKind::QueueSize {
            size_threshold,
            tracked_devices,
            disabled_until,
            ..
        } => {
            let Some(queue_size) = payload.attribute_u64("queueSize") else {
                return false;
            };
            let Some(device) = payload.property_str("device") else {
                return false;
            };
            u64::from(*size_threshold) <= queue_size
                && tracked_devices.iter().any(|tracked| tracked == device)
                && *disabled_until <= now
        }
        TriggerKind::ExecutionResult { application_name } => payload
            .attribute_str("quantumApplicationName")
            .is_some_and(|name| name == application_name),
        TriggerKind::Basic => payload
            .attribute_str("triggerName")
            .is_some_and(|name| name == trigger.name),
    }
}

/// Manages triggers and routes domain events to them.
pub struct TriggerEngine {
    store: Arc<dyn Store>,
    faas: Arc<dyn FaasGateway>,
    executions: Arc<ExecutionService>,
    /// Quantum backend API token forwarded to fired actions so they can
    /// submit jobs. Scrubbed from persisted input parameters.
    api_token: String,
}

impl TriggerEngine {
    pub fn new(
        store: Arc<dyn Store>,
        faas: Arc<dyn FaasGateway>,
        executions: Arc<ExecutionService>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            store,
            faas,
            executions,
            api_token: api_token.into(),
        }
    }

    /// Register a trigger: conflict-check the name, deploy the runtime
    /// trigger, persist.
    pub async fn create(&self, trigger: EventTrigger) -> EngineResult<EventTrigger> {
        if self.store.trigger(&trigger.name).await?.is_some() {
            return Err(EngineError::conflict("trigger", &trigger.name));
        }
        let provider = self.provider_of(&trigger.provider).await?;

        self.faas.deploy_trigger(&provider, &trigger).await?;
        self.store.save_trigger(&trigger).await?;
        tracing::info!(trigger = %trigger.name, provider = %provider.name, "trigger created");
        Ok(trigger)
    }

    /// Match `payload` against every registered trigger and fire the
    /// matches.
    ///
    /// A fired single-shot queue-size trigger is deleted immediately; one
    /// with a re-arm delay has its suppression window advanced. Failures on
    /// one trigger are logged and do not stop the remaining matches.
    pub async fn emit(&self, payload: &EventPayload) -> EngineResult<()> {
        let now = Utc::now();
        for trigger in self.store.triggers().await? {
            if !matches(&trigger, payload, now) {
                continue;
            }
            if let Err(e) = self.fire(&trigger, payload).await {
                tracing::warn!(trigger = %trigger.name, error = %e, "trigger fire failed");
                continue;
            }
            if let Err(e) = self.rearm_or_delete(trigger, now).await {
                tracing::warn!(error = %e, "trigger post-fire bookkeeping failed");
            }
        }
        Ok(())
    }

    /// Fire one trigger on the FaaS runtime and materialize the action
    /// activations its logs name.
    ///
    /// Surfaces [`qwhisk_faas::FaasError::NoActivation`] when the runtime
    /// reports no activation id, which means the trigger has no active
    /// rules.
    pub async fn fire(
        &self,
        trigger: &EventTrigger,
        payload: &EventPayload,
    ) -> EngineResult<Vec<ScriptExecution>> {
        let provider = self.provider_of(&trigger.provider).await?;
        let mut properties: serde_json::Map<String, Value> =
            payload.properties.clone().into_iter().collect();
        if !self.api_token.is_empty() {
            properties.insert("apiToken".into(), Value::String(self.api_token.clone()));
        }
        let params = Value::Object(properties);
        let fired_at = Utc::now();

        let result = self
            .faas
            .fire_trigger(&provider, &trigger.name, &params)
            .await?;
        tracing::info!(
            trigger = %trigger.name,
            activation = %result.activation_id,
            "trigger fired"
        );

        let Some(activation) = self
            .faas
            .activation(&provider, &result.activation_id)
            .await?
        else {
            tracing::warn!(
                trigger = %trigger.name,
                activation = %result.activation_id,
                "trigger activation not yet materialized, no executions recorded"
            );
            return Ok(Vec::new());
        };

        self.executions
            .create_from_logs(&provider, &activation.logs, fired_at, &params)
            .await
    }

    /// Link an application to a trigger and deploy the runtime rule.
    ///
    /// Both sides must live in the same provider namespace; the check runs
    /// before any runtime call.
    pub async fn register_application(
        &self,
        trigger_name: &str,
        application_name: &str,
    ) -> EngineResult<EventTrigger> {
        let mut trigger = self.trigger_named(trigger_name).await?;
        let application = self
            .store
            .application(application_name)
            .await?
            .ok_or_else(|| EngineError::not_found("application", application_name))?;

        let trigger_provider = self.provider_of(&trigger.provider).await?;
        let application_provider = self.provider_of(&application.provider).await?;
        if trigger_provider.namespace_key() != application_provider.namespace_key() {
            return Err(EngineError::NamespaceMismatch {
                trigger_namespace: format!(
                    "{}/{}",
                    trigger_provider.name, trigger_provider.namespace
                ),
                application_namespace: format!(
                    "{}/{}",
                    application_provider.name, application_provider.namespace
                ),
            });
        }

        if trigger.applications.iter().any(|a| a == application_name) {
            return Ok(trigger);
        }

        self.faas
            .deploy_rule(&trigger_provider, &trigger.name, &application.name)
            .await?;
        trigger.applications.push(application.name);
        self.store.save_trigger(&trigger).await?;
        Ok(trigger)
    }

    /// Unlink an application from a trigger and remove the runtime rule.
    pub async fn unregister_application(
        &self,
        trigger_name: &str,
        application_name: &str,
    ) -> EngineResult<EventTrigger> {
        let mut trigger = self.trigger_named(trigger_name).await?;
        if !trigger.applications.iter().any(|a| a == application_name) {
            return Ok(trigger);
        }
        let provider = self.provider_of(&trigger.provider).await?;

        self.faas
            .remove_rule(&provider, &trigger.name, application_name)
            .await?;
        trigger.applications.retain(|a| a != application_name);
        self.store.save_trigger(&trigger).await?;
        Ok(trigger)
    }

    /// Tear a trigger down: every rule first, then the association, then
    /// the local row, then the runtime trigger.
    pub async fn delete(&self, trigger_name: &str) -> EngineResult<()> {
        let mut trigger = self.trigger_named(trigger_name).await?;
        let provider = self.provider_of(&trigger.provider).await?;

        for application in &trigger.applications {
            self.faas
                .remove_rule(&provider, &trigger.name, application)
                .await?;
        }
        trigger.applications.clear();
        self.store.delete_trigger(&trigger.name).await?;
        self.faas.remove_trigger(&provider, &trigger.name).await?;
        tracing::info!(trigger = %trigger.name, "trigger deleted");
        Ok(())
    }

    async fn rearm_or_delete(&self, mut trigger: EventTrigger, now: DateTime<Utc>) -> EngineResult<()> {
        match &mut trigger.kind {
            TriggerKind::QueueSize {
                trigger_delay: None,
                ..
            } => {
                tracing::debug!(trigger = %trigger.name, "removing single-shot trigger after fire");
                self.delete(&trigger.name).await
            }
            TriggerKind::QueueSize {
                trigger_delay: Some(delay_minutes),
                disabled_until,
                ..
            } => {
                *disabled_until = now + Duration::minutes(*delay_minutes);
                self.store.save_trigger(&trigger).await?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn trigger_named(&self, name: &str) -> EngineResult<EventTrigger> {
        self.store
            .trigger(name)
            .await?
            .ok_or_else(|| EngineError::not_found("trigger", name))
    }

    async fn provider_of(&self, name: &str) -> EngineResult<Provider> {
        self.store
            .provider(name)
            .await?
            .ok_or_else(|| EngineError::not_found("provider", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_size_matching() {
        let trigger = EventTrigger::queue_size("qs", "local", 5, vec!["d1".into()], Some(10));
        let now = Utc::now();

        assert!(matches(&trigger, &EventPayload::queue_size("d1", 12), now));
        assert!(matches(&trigger, &EventPayload::queue_size("d1", 5), now));
        // Below the threshold.
        assert!(!matches(&trigger, &EventPayload::queue_size("d1", 4), now));
        // Untracked device.
        assert!(!matches(&trigger, &EventPayload::queue_size("d2", 12), now));
    }

    #[test]
    fn test_disabled_until_suppresses_match() {
        let mut trigger = EventTrigger::queue_size("qs", "local", 5, vec!["d1".into()], Some(10));
        let now = Utc::now();
        if let TriggerKind::QueueSize { disabled_until, .. } = &mut trigger.kind {
            *disabled_until = now + Duration::minutes(10);
        }
        assert!(!matches(&trigger, &EventPayload::queue_size("d1", 12), now));

        // Window elapsed.
        assert!(matches(
            &trigger,
            &EventPayload::queue_size("d1", 12),
            now + Duration::minutes(11)
        ));
    }

    #[test]
    fn test_execution_result_matching() {
        let trigger = EventTrigger::execution_result("er", "local", "shor");
        let now = Utc::now();
        let hit = EventPayload::execution_result("shor", "d1", serde_json::json!({}));
        let miss = EventPayload::execution_result("grover", "d1", serde_json::json!({}));
        assert!(matches(&trigger, &hit, now));
        assert!(!matches(&trigger, &miss, now));
    }

    #[test]
    fn test_basic_matching_by_name() {
        let trigger = EventTrigger::basic("nightly", "local");
        let now = Utc::now();
        assert!(matches(&trigger, &EventPayload::basic("nightly"), now));
        assert!(!matches(&trigger, &EventPayload::basic("hourly"), now));
    }

    #[test]
    fn test_event_type_mismatch_never_matches() {
        let trigger = EventTrigger::queue_size("qs", "local", 0, vec!["d1".into()], None);
        let now = Utc::now();
        assert!(!matches(&trigger, &EventPayload::basic("qs"), now));
    }

    #[test]
    fn test_foreign_attributes_do_not_cross_fire() {
        let now = Utc::now();

        // A queue event carrying a basic-style attribute must not reach a
        // basic trigger of that name.
        let basic = EventTrigger::basic("nightly", "local");
        let queue_event =
            EventPayload::queue_size("d1", 12).with_attribute("triggerName", "nightly");
        assert!(!matches(&basic, &queue_event, now));

        // Nor the other way around: a basic event dressed with queue
        // attributes stays away from queue-size triggers.
        let queue = EventTrigger::queue_size("qs", "local", 5, vec!["d1".into()], Some(10));
        let basic_event = EventPayload::basic("qs")
            .with_attribute("queueSize", 12)
            .with_property("device", "d1");
        assert!(!matches(&queue, &basic_event, now));
    }
}
