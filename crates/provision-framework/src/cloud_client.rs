//! # CloudResourceClient Trait
//!
//! The seam between the orchestrator and a concrete control plane. Anything that can
//! accept create/delete requests and report operation status can drive a
//! [`ProvisioningOrchestrator`](crate::ProvisioningOrchestrator): the in-process
//! [`SimulatedCloudClient`](crate::simulator::SimulatedCloudClient), the
//! [`RetryingClient`](crate::RetryingClient) decorator, or a vendor SDK adapter.
//!
//! Implementations hold only read-only configuration (credentials, subscription
//! scope) and must be safe to share across tasks.
use crate::error::{PollingError, RequestError, SubmissionError};
use crate::request::{OperationHandle, OperationStatus, ResourceRequest};
use crate::resource::{ResourceId, ResourceKind, ResourceRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default interval between status polls when a provider does not advertise one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a name-availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAvailability {
    pub available: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl NameAvailability {
    pub fn available() -> Self {
        Self {
            available: true,
            reason: None,
            message: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
            message: Some(message.into()),
        }
    }
}

/// Capabilities the orchestrator needs from a control plane.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use provision_framework::{
///     CloudResourceClient, OperationHandle, OperationKind, OperationStatus, PollingError,
///     RequestError, ResourceId, ResourceRecord, ResourceRequest, SubmissionError,
/// };
/// use serde_json::Value;
///
/// /// A control plane that refuses everything.
/// struct ReadOnlyCloud;
///
/// #[async_trait]
/// impl CloudResourceClient for ReadOnlyCloud {
///     async fn create_or_update(&self, _: &ResourceRequest) -> Result<OperationHandle, SubmissionError> {
///         Err(SubmissionError::Rejected("read-only".into()))
///     }
///     async fn delete(&self, _: &ResourceId) -> Result<OperationHandle, SubmissionError> {
///         Err(SubmissionError::Rejected("read-only".into()))
///     }
///     async fn get(&self, _: &ResourceId) -> Result<Option<ResourceRecord>, RequestError> {
///         Ok(None)
///     }
///     async fn poll_status(&self, handle: &OperationHandle) -> Result<OperationStatus, PollingError> {
///         Err(PollingError::UnknownOperation(handle.operation_id().to_string()))
///     }
///     async fn invoke(&self, id: &ResourceId, _: &str) -> Result<Value, RequestError> {
///         Err(RequestError::NotFound(id.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait CloudResourceClient: Send + Sync {
    /// Checks whether `name` can be used for a new resource of `kind` in `resource_group`.
    ///
    /// Providers without a separate availability API can keep the default.
    async fn check_name_availability(
        &self,
        _kind: ResourceKind,
        _resource_group: &str,
        _name: &str,
    ) -> Result<NameAvailability, SubmissionError> {
        Ok(NameAvailability::available())
    }

    /// Starts creating or updating the resource described by `request`.
    async fn create_or_update(
        &self,
        request: &ResourceRequest,
    ) -> Result<OperationHandle, SubmissionError>;

    /// Starts deleting the resource at `id`.
    async fn delete(&self, id: &ResourceId) -> Result<OperationHandle, SubmissionError>;

    /// Reads the current state of a resource. `Ok(None)` when it does not exist.
    async fn get(&self, id: &ResourceId) -> Result<Option<ResourceRecord>, RequestError>;

    /// Reports the current status of an in-flight operation.
    async fn poll_status(&self, handle: &OperationHandle)
        -> Result<OperationStatus, PollingError>;

    /// Runs a resource action such as `listKeys`.
    async fn invoke(&self, id: &ResourceId, action: &str) -> Result<Value, RequestError>;

    /// How long to wait between polls of `handle`.
    fn poll_interval(&self, _handle: &OperationHandle) -> Duration {
        DEFAULT_POLL_INTERVAL
    }
}

#[async_trait]
impl<C: CloudResourceClient + ?Sized> CloudResourceClient for std::sync::Arc<C> {
    async fn check_name_availability(
        &self,
        kind: ResourceKind,
        resource_group: &str,
        name: &str,
    ) -> Result<NameAvailability, SubmissionError> {
        (**self)
            .check_name_availability(kind, resource_group, name)
            .await
    }

    async fn create_or_update(
        &self,
        request: &ResourceRequest,
    ) -> Result<OperationHandle, SubmissionError> {
        (**self).create_or_update(request).await
    }

    async fn delete(&self, id: &ResourceId) -> Result<OperationHandle, SubmissionError> {
        (**self).delete(id).await
    }

    async fn get(&self, id: &ResourceId) -> Result<Option<ResourceRecord>, RequestError> {
        (**self).get(id).await
    }

    async fn poll_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, PollingError> {
        (**self).poll_status(handle).await
    }

    async fn invoke(&self, id: &ResourceId, action: &str) -> Result<Value, RequestError> {
        (**self).invoke(id, action).await
    }

    fn poll_interval(&self, handle: &OperationHandle) -> Duration {
        (**self).poll_interval(handle)
    }
}
