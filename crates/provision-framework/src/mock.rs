//! # Mock Control Plane & Testing Guide
//!
//! [`MockCloud`] answers the same [`CloudRequest`] messages as the
//! [`SimulatedCloud`](crate::simulator::SimulatedCloud), but from a queue of scripted
//! expectations. It lets you pin the exact status sequence an operation goes through,
//! which the simulator only produces as a function of time.
//!
//! ## When to use Mocks vs the Simulator
//!
//! | Feature | MockCloud | SimulatedCloud |
//! |---------|-----------|----------------|
//! | **Determinism** | Exact scripted responses | Driven by (tokio) time |
//! | **State** | None | Resource groups, networks, storage |
//! | **Use Case** | Orchestrator and client-wrapper logic | End-to-end provisioning flows |
//! | **Error Injection** | Any response (`return_err`) | Failures, transient polls, provider cancel |
//!
//! ## Scripting a Wait
//!
//! ```rust
//! use provision_framework::mock::MockCloud;
//! use provision_framework::{
//!     CancellableContext, OperationHandle, OperationKind, OperationOutcome, OperationStatus,
//!     ProvisioningError, ProvisioningOrchestrator, ResourceKind, ResourceRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockCloud::new();
//!     let request = ResourceRequest::new("rg-1", "vnet-a", ResourceKind::VirtualNetwork);
//!     let id = request.resource_id("sub");
//!
//!     mock.expect_create_or_update()
//!         .return_ok(OperationHandle::new("op-1", id, OperationKind::CreateOrUpdate));
//!     mock.expect_poll().return_status(OperationStatus::Running);
//!     mock.expect_poll()
//!         .return_status(OperationStatus::Failed(ProvisioningError::internal("quota exceeded")));
//!
//!     let orchestrator = ProvisioningOrchestrator::new(mock.client());
//!     let handle = orchestrator.submit(&request).await.unwrap();
//!     let outcome = orchestrator
//!         .await_completion(handle, &CancellableContext::new())
//!         .await
//!         .unwrap();
//!     assert!(matches!(outcome, OperationOutcome::Failure(e) if e.message == "quota exceeded"));
//!     mock.verify();
//! }
//! ```
//!
//! Name checks are answered with "available" unless a
//! [`expect_check_name`](MockCloud::expect_check_name) expectation is next in line.
//!
//! ## Mocking Utilities
//!
//! Use [`create_mock_client`] to get a client and the raw receiver, or the fluent
//! [`MockCloud`] API.

use crate::cloud_client::NameAvailability;
use crate::error::{PollingError, RequestError, SubmissionError};
use crate::request::{OperationHandle, OperationStatus, ResourceRequest};
use crate::resource::{ResourceId, ResourceRecord};
use crate::simulator::{CloudRequest, Reply, SimulatedCloudClient};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

const MOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

enum Expectation {
    CheckName {
        response: Result<NameAvailability, SubmissionError>,
    },
    CreateOrUpdate {
        response: Result<OperationHandle, SubmissionError>,
    },
    Delete {
        response: Result<OperationHandle, SubmissionError>,
    },
    Get {
        response: Result<Option<ResourceRecord>, RequestError>,
    },
    Poll {
        response: Result<OperationStatus, PollingError>,
    },
    Invoke {
        response: Result<Value, RequestError>,
    },
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

fn lock(expectations: &Expectations) -> MutexGuard<'_, VecDeque<Expectation>> {
    expectations.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scripted control plane with expectation tracking.
pub struct MockCloud {
    client: SimulatedCloudClient,
    expectations: Expectations,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCloud {
    /// Creates a mock with no expectations. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<CloudRequest>(100);
        let expectations: Expectations = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = {
                    let mut exps = lock(&expectations_clone);
                    let scripted_check =
                        matches!(exps.front(), Some(Expectation::CheckName { .. }));
                    if matches!(request, CloudRequest::CheckName { .. }) && !scripted_check {
                        None
                    } else {
                        exps.pop_front()
                    }
                };

                match (request, expectation) {
                    (CloudRequest::CheckName { respond_to, .. }, None) => {
                        let _ = respond_to.send(Ok(NameAvailability::available()));
                    }
                    (
                        CloudRequest::CheckName { respond_to, .. },
                        Some(Expectation::CheckName { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CloudRequest::CreateOrUpdate { respond_to, .. },
                        Some(Expectation::CreateOrUpdate { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CloudRequest::Delete { respond_to, .. },
                        Some(Expectation::Delete { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (CloudRequest::Get { respond_to, .. }, Some(Expectation::Get { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CloudRequest::Poll { respond_to, .. },
                        Some(Expectation::Poll { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CloudRequest::Invoke { respond_to, .. },
                        Some(Expectation::Invoke { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => {
                        panic!("Unexpected request or expectation mismatch: {request:?}");
                    }
                }
            }
        });

        Self {
            client: SimulatedCloudClient::new(sender)
                .authorized("mock-token")
                .with_poll_interval(MOCK_POLL_INTERVAL),
            expectations,
            _handle: handle,
        }
    }

    /// Returns an authorized client bound to this mock.
    pub fn client(&self) -> SimulatedCloudClient {
        self.client.clone()
    }

    pub fn expect_check_name(&mut self) -> ExpectationBuilder<NameAvailability, SubmissionError> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::CheckName {
            response,
        })
    }

    pub fn expect_create_or_update(
        &mut self,
    ) -> ExpectationBuilder<OperationHandle, SubmissionError> {
        ExpectationBuilder::new(&self.expectations, |response| {
            Expectation::CreateOrUpdate { response }
        })
    }

    pub fn expect_delete(&mut self) -> ExpectationBuilder<OperationHandle, SubmissionError> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::Delete {
            response,
        })
    }

    pub fn expect_get(&mut self) -> ExpectationBuilder<Option<ResourceRecord>, RequestError> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::Get { response })
    }

    pub fn expect_poll(&mut self) -> ExpectationBuilder<OperationStatus, PollingError> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::Poll { response })
    }

    pub fn expect_invoke(&mut self) -> ExpectationBuilder<Value, RequestError> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::Invoke {
            response,
        })
    }

    /// Number of expectations not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.expectations).len()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = self.remaining();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

/// Queues the response for one expected request.
pub struct ExpectationBuilder<T, E> {
    expectations: Expectations,
    wrap: fn(Result<T, E>) -> Expectation,
}

impl<T, E> ExpectationBuilder<T, E> {
    fn new(expectations: &Expectations, wrap: fn(Result<T, E>) -> Expectation) -> Self {
        Self {
            expectations: expectations.clone(),
            wrap,
        }
    }

    pub fn return_ok(self, value: T) {
        lock(&self.expectations).push_back((self.wrap)(Ok(value)));
    }

    pub fn return_err(self, error: E) {
        lock(&self.expectations).push_back((self.wrap)(Err(error)));
    }
}

impl ExpectationBuilder<OperationStatus, PollingError> {
    /// Shorthand for `return_ok` on poll expectations.
    pub fn return_status(self, status: OperationStatus) {
        self.return_ok(status);
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates an authorized client and the receiver its requests arrive on.
///
/// Lets a test play the control plane by hand: receive the next request, assert on it,
/// and reply through its `respond_to` sender. Consider [`MockCloud`] for a more fluent API.
pub fn create_mock_client(
    buffer_size: usize,
) -> (SimulatedCloudClient, mpsc::Receiver<CloudRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let client = SimulatedCloudClient::new(sender)
        .authorized("mock-token")
        .with_poll_interval(MOCK_POLL_INTERVAL);
    (client, receiver)
}

/// Takes the next request if it is a name check.
pub async fn expect_check_name(
    receiver: &mut mpsc::Receiver<CloudRequest>,
) -> Option<(String, Reply<NameAvailability, SubmissionError>)> {
    match receiver.recv().await {
        Some(CloudRequest::CheckName {
            name, respond_to, ..
        }) => Some((name, respond_to)),
        _ => None,
    }
}

/// Takes the next request if it is a create-or-update.
pub async fn expect_create_or_update(
    receiver: &mut mpsc::Receiver<CloudRequest>,
) -> Option<(ResourceRequest, Reply<OperationHandle, SubmissionError>)> {
    match receiver.recv().await {
        Some(CloudRequest::CreateOrUpdate {
            request,
            respond_to,
        }) => Some((request, respond_to)),
        _ => None,
    }
}

/// Takes the next request if it is a delete.
pub async fn expect_delete(
    receiver: &mut mpsc::Receiver<CloudRequest>,
) -> Option<(ResourceId, Reply<OperationHandle, SubmissionError>)> {
    match receiver.recv().await {
        Some(CloudRequest::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Takes the next request if it is a status poll.
pub async fn expect_poll(
    receiver: &mut mpsc::Receiver<CloudRequest>,
) -> Option<(String, Reply<OperationStatus, PollingError>)> {
    match receiver.recv().await {
        Some(CloudRequest::Poll {
            operation_id,
            respond_to,
        }) => Some((operation_id, respond_to)),
        _ => None,
    }
}

/// Takes the next request if it is a get.
pub async fn expect_get(
    receiver: &mut mpsc::Receiver<CloudRequest>,
) -> Option<(ResourceId, Reply<Option<ResourceRecord>, RequestError>)> {
    match receiver.recv().await {
        Some(CloudRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Takes the next request if it is a resource action.
pub async fn expect_invoke(
    receiver: &mut mpsc::Receiver<CloudRequest>,
) -> Option<(ResourceId, String, Reply<Value, RequestError>)> {
    match receiver.recv().await {
        Some(CloudRequest::Invoke {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
