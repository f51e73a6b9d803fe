//! # Provision Framework
//!
//! Building blocks for provisioning cloud resources through a control plane that
//! answers every create and delete with a **long-running operation**. The caller submits
//! a request, receives an [`OperationHandle`], and polls until the operation reaches a
//! terminal state.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Model Layer** ([`ResourceRequest`], [`ResourceId`], [`ResourceRecord`]) - what is
//!    being asked for and what comes back.
//! 2. **Protocol Layer** ([`ProvisioningOrchestrator`]) - submit, poll, and map terminal
//!    states to an [`OperationOutcome`], racing every wait against a
//!    [`CancellableContext`].
//! 3. **Collaborator Layer** ([`CloudResourceClient`]) - the control plane itself: the
//!    in-process [`simulator`], the scripted [`mock`], or a vendor adapter, optionally
//!    wrapped in a [`RetryingClient`].
//!
//! ## Operation Lifecycle
//!
//! ```text
//! Submitted -> Accepted -> Running -> Succeeded | Failed | Canceled
//! ```
//!
//! States only move forward. A [`ResourceRecord`] is produced only after `Succeeded` was
//! observed; `Failed` carries the provider's diagnostic in a [`ProvisioningError`].
//!
//! ## Example
//!
//! ```rust
//! use provision_framework::simulator::{SimulatedCloud, SimulationProfile};
//! use provision_framework::{
//!     CancellableContext, OperationOutcome, ProvisioningOrchestrator, ResourceKind,
//!     ResourceRequest,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (cloud, client) = SimulatedCloud::new("sub-1", SimulationProfile::instant());
//!     tokio::spawn(cloud.run());
//!     let orchestrator = ProvisioningOrchestrator::new(client.authorized("token"));
//!     let ctx = CancellableContext::new();
//!
//!     let group = ResourceRequest::new("rg-1", "rg-1", ResourceKind::ResourceGroup);
//!     orchestrator.provision(&group, &ctx).await.unwrap();
//!
//!     let vnet = ResourceRequest::new("rg-1", "vnet-a", ResourceKind::VirtualNetwork)
//!         .with_spec(json!({
//!             "properties": { "addressSpace": { "addressPrefixes": ["10.0.0.0/8"] } }
//!         }));
//!     let handle = orchestrator.submit(&vnet).await.unwrap();
//!     match orchestrator.await_completion(handle, &ctx).await.unwrap() {
//!         OperationOutcome::Success(record) => assert_eq!(record.name, "vnet-a"),
//!         other => panic!("unexpected outcome: {other:?}"),
//!     }
//! }
//! ```
//!
//! ## Cancellation
//!
//! Canceling the [`CancellableContext`] abandons the wait within one polling interval and
//! returns [`WaitError::Canceled`]. The remote operation is **not** canceled; it keeps
//! running and its effects still land.
//!
//! ## Testing
//!
//! [`mock::MockCloud`] scripts exact status sequences; [`simulator::SimulatedCloud`]
//! provides a stateful control plane with failure injection. See the [`mock`] module for
//! usage patterns.

pub mod cloud_client;
pub mod context;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod request;
pub mod resource;
pub mod retry;
pub mod simulator;

// Re-export core types for convenience
pub use cloud_client::{CloudResourceClient, NameAvailability, DEFAULT_POLL_INTERVAL};
pub use context::CancellableContext;
pub use error::{
    ContextCanceledError, FailureCode, OrchestratorError, PollingError, ProvisioningError,
    RequestError, SubmissionError, WaitError,
};
pub use orchestrator::{ProvisioningOrchestrator, StateTracker};
pub use request::{
    OperationHandle, OperationKind, OperationOutcome, OperationState, OperationStatus,
    ResourceRequest,
};
pub use resource::{ParseResourceIdError, ResourceId, ResourceKind, ResourceRecord};
pub use retry::{retry_with_backoff, RetryConfig, RetryingClient};
