//! # Provisioning Orchestrator
//!
//! Submits requests to a [`CloudResourceClient`] and waits for the resulting
//! long-running operations to reach a terminal state.
//!
//! ## The completion protocol
//!
//! 1. [`submit`](ProvisioningOrchestrator::submit) checks name availability, then sends
//!    the request. Synchronous rejections come back as [`SubmissionError`].
//! 2. [`await_completion`](ProvisioningOrchestrator::await_completion) polls the handle at
//!    the interval the client advertises. Each poll and each sleep races the caller's
//!    [`CancellableContext`], so a canceled wait returns within one polling interval.
//! 3. Terminal states become an [`OperationOutcome`]. A record is only produced after
//!    `Succeeded` was observed.
//!
//! Canceling the wait never cancels the remote operation. Failed operations are never
//! retried here; resubmitting is the caller's decision.

use crate::cloud_client::CloudResourceClient;
use crate::context::CancellableContext;
use crate::error::{
    OrchestratorError, PollingError, ProvisioningError, RequestError, SubmissionError, WaitError,
};
use crate::request::{
    OperationHandle, OperationKind, OperationOutcome, OperationState, OperationStatus,
    ResourceRequest,
};
use crate::resource::{ResourceId, ResourceRecord};
use tracing::{debug, info, instrument, warn};

/// Records the states one handle moved through and enforces forward-only transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTracker {
    history: Vec<OperationState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            history: vec![OperationState::Submitted],
        }
    }
}

impl StateTracker {
    pub fn current(&self) -> OperationState {
        // history always starts with Submitted
        self.history[self.history.len() - 1]
    }

    /// Applies a reported state. Returns `false` if the report would move backwards
    /// (or out of a terminal state) and was ignored.
    pub fn advance(&mut self, next: OperationState) -> bool {
        let current = self.current();
        if !current.can_advance_to(next) {
            return false;
        }
        if next != current {
            self.history.push(next);
        }
        true
    }

    pub fn history(&self) -> &[OperationState] {
        &self.history
    }
}

/// Drives submit/await pairs against a control plane.
///
/// Cheap to clone when the client is; holds no per-request state, so concurrent waits on
/// distinct handles never interfere.
#[derive(Clone, Debug)]
pub struct ProvisioningOrchestrator<C> {
    client: C,
}

impl<C: CloudResourceClient> ProvisioningOrchestrator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Sends a create-or-update request and returns the handle of the started operation.
    #[instrument(skip(self, request), fields(kind = %request.kind, name = %request.resource_name))]
    pub async fn submit(
        &self,
        request: &ResourceRequest,
    ) -> Result<OperationHandle, SubmissionError> {
        debug!(?request, "submit called");
        let availability = self
            .client
            .check_name_availability(request.kind, &request.resource_group, &request.resource_name)
            .await?;
        if !availability.available {
            let message = availability
                .message
                .or(availability.reason)
                .unwrap_or_else(|| "name is not available".to_string());
            warn!(%message, "Name not available");
            return Err(SubmissionError::NameUnavailable {
                name: request.resource_name.clone(),
                message,
            });
        }

        let handle = self.client.create_or_update(request).await?;
        info!(operation_id = handle.operation_id(), "Submitted");
        Ok(handle)
    }

    /// Starts deleting the resource at `id`.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn delete(&self, id: &ResourceId) -> Result<OperationHandle, SubmissionError> {
        let handle = self.client.delete(id).await?;
        info!(operation_id = handle.operation_id(), "Delete submitted");
        Ok(handle)
    }

    /// Reads a resource without starting an operation.
    pub async fn get(&self, id: &ResourceId) -> Result<Option<ResourceRecord>, RequestError> {
        self.client.get(id).await
    }

    /// Waits for `handle` to reach a terminal state.
    ///
    /// Returns `Err(WaitError::Canceled)` if `ctx` is canceled or its deadline passes
    /// first; the remote operation keeps running in that case.
    #[instrument(skip_all, fields(operation_id = handle.operation_id(), op = %handle.operation()))]
    pub async fn await_completion(
        &self,
        handle: OperationHandle,
        ctx: &CancellableContext,
    ) -> Result<OperationOutcome, WaitError> {
        let (outcome, tracker) = self.wait(&handle, ctx).await?;
        debug!(history = ?tracker.history(), "Operation finished");
        Ok(outcome)
    }

    /// Like [`await_completion`](Self::await_completion), also returning the recorded
    /// state sequence.
    pub async fn await_with_history(
        &self,
        handle: OperationHandle,
        ctx: &CancellableContext,
    ) -> Result<(OperationOutcome, StateTracker), WaitError> {
        self.wait(&handle, ctx).await
    }

    async fn wait(
        &self,
        handle: &OperationHandle,
        ctx: &CancellableContext,
    ) -> Result<(OperationOutcome, StateTracker), WaitError> {
        let mut tracker = StateTracker::default();

        loop {
            if let Some(err) = ctx.err() {
                warn!(error = %err, state = ?tracker.current(), "Wait abandoned");
                return Err(err.into());
            }

            let status = tokio::select! {
                biased;
                err = ctx.done() => {
                    warn!(error = %err, state = ?tracker.current(), "Wait abandoned");
                    return Err(err.into());
                }
                status = self.client.poll_status(handle) => status?,
            };

            if !tracker.advance(status.state()) {
                warn!(
                    current = ?tracker.current(),
                    reported = ?status.state(),
                    "Ignoring backwards status report"
                );
            } else if status.is_terminal() {
                let outcome = self.finish(handle, status).await?;
                return Ok((outcome, tracker));
            } else {
                debug!(state = ?tracker.current(), "Still in progress");
            }

            let interval = self.client.poll_interval(handle);
            tokio::select! {
                biased;
                err = ctx.done() => {
                    warn!(error = %err, state = ?tracker.current(), "Wait abandoned");
                    return Err(err.into());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn finish(
        &self,
        handle: &OperationHandle,
        status: OperationStatus,
    ) -> Result<OperationOutcome, WaitError> {
        let outcome = match (status, handle.operation()) {
            (OperationStatus::Succeeded(_), OperationKind::Delete) => {
                OperationOutcome::Deleted(handle.resource_id().clone())
            }
            (OperationStatus::Succeeded(Some(record)), OperationKind::CreateOrUpdate) => {
                OperationOutcome::Success(record)
            }
            (OperationStatus::Succeeded(None), OperationKind::CreateOrUpdate) => {
                match self.client.get(handle.resource_id()).await? {
                    Some(record) => OperationOutcome::Success(record),
                    None => {
                        return Err(WaitError::Fetch(RequestError::NotFound(
                            handle.resource_id().to_string(),
                        )))
                    }
                }
            }
            (OperationStatus::Failed(e), _) => OperationOutcome::Failure(e),
            (OperationStatus::Canceled, _) => OperationOutcome::Failure(
                ProvisioningError::canceled("operation was canceled by the provider"),
            ),
            (OperationStatus::Accepted | OperationStatus::Running, _) => {
                return Err(WaitError::Polling(PollingError::UnknownOperation(
                    handle.operation_id().to_string(),
                )))
            }
        };

        match &outcome {
            OperationOutcome::Failure(e) => warn!(code = %e.code, error = %e.message, "Operation failed"),
            _ => info!("Operation succeeded"),
        }
        Ok(outcome)
    }

    /// Submits `request` and waits for the resource to be provisioned.
    pub async fn provision(
        &self,
        request: &ResourceRequest,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, OrchestratorError> {
        let handle = self.submit(request).await?;
        match self.await_completion(handle, ctx).await?.into_result()? {
            OperationOutcome::Success(record) => Ok(record),
            // a create handle never finishes as a delete
            other => Err(ProvisioningError::internal(format!(
                "unexpected outcome for create: {other:?}"
            ))
            .into()),
        }
    }

    /// Deletes the resource at `id` and waits for the deletion to finish.
    pub async fn remove(
        &self,
        id: &ResourceId,
        ctx: &CancellableContext,
    ) -> Result<(), OrchestratorError> {
        let handle = self.delete(id).await?;
        self.await_completion(handle, ctx).await?.into_result()?;
        Ok(())
    }
}
