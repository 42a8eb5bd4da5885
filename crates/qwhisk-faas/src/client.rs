//! FaaS runtime API client.
//!
//! All entity URLs live under `{base_url}/namespaces/{namespace}/...` of a
//! registered provider; every request carries the provider's basic-auth
//! credential. Deployments use `?overwrite=true` semantics keyed by name, so
//! re-deploying an existing entity is an update rather than a conflict.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};

use qwhisk_types::{EventTrigger, Provider, QuantumApplication};

use crate::error::{FaasError, FaasResult};
use crate::wire::{Action, Activation, ActivationResult, Annotation, Exec, Rule, Trigger};

/// Remote lifecycle operations on a provider's FaaS runtime.
///
/// The engine only depends on this trait; [`OpenWhiskClient`] is the HTTP
/// implementation, tests substitute recording mocks.
#[async_trait]
pub trait FaasGateway: Send + Sync {
    /// Deploy (or overwrite) the action backing an application.
    async fn deploy_action(
        &self,
        provider: &Provider,
        application: &QuantumApplication,
    ) -> FaasResult<()>;

    /// Remove an action by name.
    async fn remove_action(&self, provider: &Provider, action: &str) -> FaasResult<()>;

    /// Invoke an action, returning the resulting activation id.
    async fn invoke_action(
        &self,
        provider: &Provider,
        action: &str,
        params: &Value,
    ) -> FaasResult<ActivationResult>;

    /// Deploy (or overwrite) the trigger backing an event trigger.
    async fn deploy_trigger(&self, provider: &Provider, trigger: &EventTrigger) -> FaasResult<()>;

    /// Remove a trigger by name.
    async fn remove_trigger(&self, provider: &Provider, trigger: &str) -> FaasResult<()>;

    /// Fire a trigger with a parameter body.
    ///
    /// Fails with [`FaasError::NoActivation`] when the runtime reports no
    /// activation id, which signals the trigger has no active rules.
    async fn fire_trigger(
        &self,
        provider: &Provider,
        trigger: &str,
        params: &Value,
    ) -> FaasResult<ActivationResult>;

    /// Deploy (or overwrite) the rule linking one trigger to one action.
    async fn deploy_rule(
        &self,
        provider: &Provider,
        trigger: &str,
        action: &str,
    ) -> FaasResult<()>;

    /// Remove the rule linking one trigger to one action.
    async fn remove_rule(
        &self,
        provider: &Provider,
        trigger: &str,
        action: &str,
    ) -> FaasResult<()>;

    /// Fetch one activation by id. `None` means the activation has not
    /// materialized yet, which callers treat as "retry later".
    async fn activation(
        &self,
        provider: &Provider,
        activation_id: &str,
    ) -> FaasResult<Option<Activation>>;
}

/// HTTP implementation of [`FaasGateway`] against an OpenWhisk-shaped API.
#[derive(Debug)]
pub struct OpenWhiskClient {
    client: Client,
}

impl OpenWhiskClient {
    pub fn new() -> FaasResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }

    fn url(provider: &Provider, suffix: &str) -> String {
        format!(
            "{}/namespaces/{}/{suffix}",
            provider.base_url, provider.namespace
        )
    }

    fn auth_header(provider: &Provider) -> FaasResult<header::HeaderValue> {
        header::HeaderValue::from_str(&format!("Basic {}", provider.basic_credentials))
            .map_err(|_| FaasError::InvalidCredentials(provider.name.clone()))
    }

    /// PUT an entity body with overwrite semantics.
    async fn put_entity<T: serde::Serialize>(
        &self,
        provider: &Provider,
        suffix: &str,
        body: &T,
    ) -> FaasResult<()> {
        let url = format!("{}?overwrite=true", Self::url(provider, suffix));
        tracing::debug!(provider = %provider.name, %url, "deploying runtime entity");
        let response = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, Self::auth_header(provider)?)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_entity(&self, provider: &Provider, suffix: &str) -> FaasResult<()> {
        tracing::debug!(provider = %provider.name, %suffix, "removing runtime entity");
        let response = self
            .client
            .delete(Self::url(provider, suffix))
            .header(header::AUTHORIZATION, Self::auth_header(provider)?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> FaasResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_else(|_| "no body".into());
        Err(FaasError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Version stamped on every deployed entity.
const ENTITY_VERSION: &str = "1.0";

/// Name of the rule linking `trigger` to `action`.
pub fn rule_name(trigger: &str, action: &str) -> String {
    format!("{trigger}-{action}")
}

/// Fully qualified entity path inside a namespace.
fn qualified(namespace: &str, name: &str) -> String {
    format!("/{namespace}/{name}")
}

fn action_body(provider: &Provider, application: &QuantumApplication) -> Action {
    Action {
        namespace: provider.namespace.clone(),
        name: application.name.clone(),
        version: ENTITY_VERSION.into(),
        publish: false,
        exec: Exec {
            kind: "blackbox".into(),
            code: application.code.clone(),
            image: application.docker_image.clone(),
        },
        annotations: vec![Annotation {
            key: "exec".into(),
            value: json!("blackbox"),
        }],
    }
}

fn trigger_body(provider: &Provider, trigger: &EventTrigger) -> Trigger {
    Trigger {
        namespace: provider.namespace.clone(),
        name: trigger.name.clone(),
        version: ENTITY_VERSION.into(),
        publish: false,
    }
}

fn rule_body(provider: &Provider, trigger: &str, action: &str) -> Rule {
    Rule {
        name: rule_name(trigger, action),
        version: ENTITY_VERSION.into(),
        publish: false,
        status: "active".into(),
        trigger: qualified(&provider.namespace, trigger),
        action: qualified(&provider.namespace, action),
    }
}

#[async_trait]
impl FaasGateway for OpenWhiskClient {
    async fn deploy_action(
        &self,
        provider: &Provider,
        application: &QuantumApplication,
    ) -> FaasResult<()> {
        let body = action_body(provider, application);
        self.put_entity(provider, &format!("actions/{}", application.name), &body)
            .await
    }

    async fn remove_action(&self, provider: &Provider, action: &str) -> FaasResult<()> {
        self.delete_entity(provider, &format!("actions/{action}"))
            .await
    }

    async fn invoke_action(
        &self,
        provider: &Provider,
        action: &str,
        params: &Value,
    ) -> FaasResult<ActivationResult> {
        let response = self
            .client
            .post(Self::url(provider, &format!("actions/{action}")))
            .header(header::AUTHORIZATION, Self::auth_header(provider)?)
            .json(params)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn deploy_trigger(&self, provider: &Provider, trigger: &EventTrigger) -> FaasResult<()> {
        let body = trigger_body(provider, trigger);
        self.put_entity(provider, &format!("triggers/{}", trigger.name), &body)
            .await
    }

    async fn remove_trigger(&self, provider: &Provider, trigger: &str) -> FaasResult<()> {
        self.delete_entity(provider, &format!("triggers/{trigger}"))
            .await
    }

    async fn fire_trigger(
        &self,
        provider: &Provider,
        trigger: &str,
        params: &Value,
    ) -> FaasResult<ActivationResult> {
        let response = self
            .client
            .post(Self::url(provider, &format!("triggers/{trigger}")))
            .header(header::AUTHORIZATION, Self::auth_header(provider)?)
            .json(params)
            .send()
            .await?;
        let response = Self::check(response).await?;
        // A trigger with no active rules returns an empty body instead of an
        // activation id.
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(FaasError::NoActivation {
                trigger: trigger.to_owned(),
            });
        }
        serde_json::from_slice(&body).map_err(FaasError::from)
    }

    async fn deploy_rule(
        &self,
        provider: &Provider,
        trigger: &str,
        action: &str,
    ) -> FaasResult<()> {
        let body = rule_body(provider, trigger, action);
        self.put_entity(provider, &format!("rules/{}", body.name), &body)
            .await
    }

    async fn remove_rule(
        &self,
        provider: &Provider,
        trigger: &str,
        action: &str,
    ) -> FaasResult<()> {
        self.delete_entity(provider, &format!("rules/{}", rule_name(trigger, action)))
            .await
    }

    async fn activation(
        &self,
        provider: &Provider,
        activation_id: &str,
    ) -> FaasResult<Option<Activation>> {
        let response = self
            .client
            .get(Self::url(provider, &format!("activations/{activation_id}")))
            .header(header::AUTHORIZATION, Self::auth_header(provider)?)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Provider {
        Provider {
            id: qwhisk_types::EntityId::new(),
            name: "local".into(),
            base_url: "https://faas.example.com/api/v1".into(),
            namespace: "guest".into(),
            basic_credentials: "dXNlcjpwYXNz".into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_url_shape() {
        let url = OpenWhiskClient::url(&provider(), "actions/shor");
        assert_eq!(url, "https://faas.example.com/api/v1/namespaces/guest/actions/shor");
    }

    #[test]
    fn test_rule_name_joins_trigger_and_action() {
        assert_eq!(rule_name("queue-low", "shor"), "queue-low-shor");
    }

    #[test]
    fn test_qualified_path() {
        assert_eq!(qualified("guest", "shor"), "/guest/shor");
    }

    #[test]
    fn test_deploy_bodies_carry_version_one_zero() {
        let provider = provider();
        let application = QuantumApplication::new("shor", "code", None, None, "local");
        let action = action_body(&provider, &application);
        assert_eq!(action.version, "1.0");
        assert_eq!(action.exec.kind, "blackbox");

        let trigger = EventTrigger::basic("kick", "local");
        assert_eq!(trigger_body(&provider, &trigger).version, "1.0");

        let rule = rule_body(&provider, "kick", "shor");
        assert_eq!(rule.version, "1.0");
        assert_eq!(rule.name, "kick-shor");
        assert_eq!(rule.trigger, "/guest/kick");
        assert_eq!(rule.action, "/guest/shor");
    }
}
