//! # System Lifecycle
//!
//! Starts, wires and stops everything a provisioning run needs.
//!
//! ## The ProvisioningSystem Pattern
//!
//! [`ProvisioningSystem::start`] is the single place where the pieces meet:
//!
//! 1. **Credential resolution** - the [`CredentialProvider`](crate::credentials::CredentialProvider)
//!    must yield a token, otherwise start fails and nothing is spawned.
//! 2. **Control plane** - the simulated cloud actor is spawned on its own task.
//! 3. **Collaborator stack** - the authorized client is wrapped in a
//!    [`RetryingClient`](provision_framework::RetryingClient) and shared behind one
//!    orchestrator.
//! 4. **Clients** - one per resource area, all cloned from the same orchestrator and
//!    the same immutable [`AzureConfig`](crate::config::AzureConfig).
//!
//! ```rust,ignore
//! let config = AzureConfig::from_env()?;
//! let system = ProvisioningSystem::start(config, &EnvironmentCredentialProvider::from_env(), SimulationProfile::default())?;
//! let ctx = system.context();
//! system.resource_groups.create_configured_group(&ctx).await?;
//! system.shutdown().await?;
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Cancel the root context** - every wait derived from [`ProvisioningSystem::context`]
//!    returns `Canceled` within one polling interval.
//! 2. **Drop all clients** - closes the sender side of the control plane's channel.
//! 3. **Control plane detects closure** - `recv()` returns `None`, it logs its final state.
//! 4. **Await completion** - the task handle is joined.
//!
//! ## Observability
//!
//! [`setup_tracing`] installs the subscriber; see the [`tracing`] module.

pub mod provisioning_system;
pub mod tracing;

pub use provisioning_system::*;
pub use tracing::*;
