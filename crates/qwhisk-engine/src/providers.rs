//! Provider lifecycle.
//!
//! A provider is one FaaS-runtime endpoint plus a namespace and credential.
//! Deleting a provider tears down everything registered under it, remote
//! entities first, in a fixed order.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use qwhisk_faas::FaasGateway;
use qwhisk_store::Store;
use qwhisk_types::Provider;

use crate::error::{EngineError, EngineResult};

pub struct ProviderService {
    store: Arc<dyn Store>,
    faas: Arc<dyn FaasGateway>,
}

impl ProviderService {
    pub fn new(store: Arc<dyn Store>, faas: Arc<dyn FaasGateway>) -> Self {
        Self { store, faas }
    }

    /// Register a provider, encoding the runtime credential for basic auth.
    pub async fn register(
        &self,
        name: &str,
        base_url: &str,
        namespace: &str,
        username: &str,
        password: &str,
    ) -> EngineResult<Provider> {
        if self.store.provider(name).await?.is_some() {
            return Err(EngineError::conflict("provider", name));
        }
        let credentials = BASE64.encode(format!("{username}:{password}"));
        let provider = Provider::new(name, base_url, namespace, credentials);
        self.store.save_provider(&provider).await?;
        tracing::info!(provider = name, namespace, "provider registered");
        Ok(provider)
    }

    pub async fn get(&self, name: &str) -> EngineResult<Provider> {
        self.store
            .provider(name)
            .await?
            .ok_or_else(|| EngineError::not_found("provider", name))
    }

    pub async fn list(&self) -> EngineResult<Vec<Provider>> {
        Ok(self.store.providers().await?)
    }

    /// Tear down a provider and everything registered under it.
    ///
    /// Order: remote rules, remote triggers, local trigger rows, execution
    /// rows, job rows, applications with their remote actions, provider
    /// row. Remote entities go first so a failure never leaves the runtime
    /// holding entities the broker has already forgotten.
    pub async fn delete(&self, name: &str) -> EngineResult<()> {
        let provider = self.get(name).await?;
        let triggers = self.store.triggers_by_provider(name).await?;

        for trigger in &triggers {
            for application in &trigger.applications {
                self.faas
                    .remove_rule(&provider, &trigger.name, application)
                    .await?;
            }
        }
        for trigger in &triggers {
            self.faas.remove_trigger(&provider, &trigger.name).await?;
        }
        for trigger in &triggers {
            self.store.delete_trigger(&trigger.name).await?;
        }

        for execution in self.store.executions_by_provider(name).await? {
            self.store.delete_execution(&execution.id).await?;
        }

        let applications = self.store.applications_by_provider(name).await?;
        for application in &applications {
            for job in self.store.jobs_by_application(&application.name).await? {
                self.store.delete_job(&job.id).await?;
            }
        }
        for application in &applications {
            self.faas.remove_action(&provider, &application.name).await?;
            self.store.delete_application(&application.name).await?;
        }

        self.store.delete_provider(name).await?;
        tracing::info!(provider = name, "provider deleted");
        Ok(())
    }
}
