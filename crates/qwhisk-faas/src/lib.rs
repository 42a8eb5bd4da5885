//! FaaS runtime client for the qwhisk broker.
//!
//! Talks to an OpenWhisk-compatible REST API: actions, triggers, rules and
//! activations, all scoped to a provider's namespace and authenticated with
//! the provider's basic-auth credential.
//!
//! # Overview
//!
//! - [`FaasGateway`] is the trait the engine programs against
//! - [`OpenWhiskClient`] is the HTTP implementation
//! - Wire types live in [`wire`]
//!
//! Deployments are idempotent (`?overwrite=true`), so registering an
//! application or trigger twice updates the runtime entity in place.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{rule_name, FaasGateway, OpenWhiskClient};
pub use error::{FaasError, FaasResult};
pub use wire::{Action, Activation, ActivationResponse, ActivationResult, Rule, Trigger};
