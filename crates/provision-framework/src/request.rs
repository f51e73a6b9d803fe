//! # Requests, Handles and Outcomes
//!
//! The value types that flow through one provisioning call:
//!
//! ```text
//! ResourceRequest ──submit──▶ OperationHandle ──await_completion──▶ OperationOutcome
//!                                   │
//!                             poll_status ──▶ OperationStatus (Accepted → Running → terminal)
//! ```
//!
//! A [`ResourceRequest`] is built once and only borrowed by `submit`, so it cannot change
//! after it has been sent. An [`OperationHandle`] is deliberately not `Clone`: the wait
//! consumes it, and once an outcome exists nothing can poll the same handle again.

use crate::error::ProvisioningError;
use crate::resource::{ResourceId, ResourceKind, ResourceRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Desired state of a single resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub resource_group: String,
    pub resource_name: String,
    pub kind: ResourceKind,
    /// Name of the parent resource for child kinds (the virtual network of a subnet).
    pub parent: Option<String>,
    pub location: Option<String>,
    /// Provider-specific payload, passed through untouched.
    pub desired_spec: Value,
    pub tags: BTreeMap<String, String>,
}

impl ResourceRequest {
    pub fn new(
        resource_group: impl Into<String>,
        resource_name: impl Into<String>,
        kind: ResourceKind,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            resource_name: resource_name.into(),
            kind,
            parent: None,
            location: None,
            desired_spec: Value::Object(Default::default()),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_spec(mut self, spec: Value) -> Self {
        self.desired_spec = spec;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = (String, String)>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// The id this request resolves to inside `subscription_id`.
    pub fn resource_id(&self, subscription_id: &str) -> ResourceId {
        match (self.kind, &self.parent) {
            (ResourceKind::ResourceGroup, _) => {
                ResourceId::resource_group(subscription_id, &self.resource_name)
            }
            (kind, Some(parent)) => ResourceId::child(
                subscription_id,
                &self.resource_group,
                kind,
                parent,
                &self.resource_name,
            ),
            (kind, None) => {
                ResourceId::new(subscription_id, &self.resource_group, kind, &self.resource_name)
            }
        }
    }
}

/// What an in-flight operation is doing to its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    CreateOrUpdate,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::CreateOrUpdate => f.write_str("createOrUpdate"),
            OperationKind::Delete => f.write_str("delete"),
        }
    }
}

/// Token for an in-flight long-running operation.
#[derive(Debug, PartialEq, Eq)]
pub struct OperationHandle {
    operation_id: String,
    resource_id: ResourceId,
    operation: OperationKind,
}

impl OperationHandle {
    /// Called by [`CloudResourceClient`](crate::CloudResourceClient) implementations when
    /// the control plane accepts a request.
    pub fn new(
        operation_id: impl Into<String>,
        resource_id: ResourceId,
        operation: OperationKind,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            resource_id,
            operation,
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource_id.kind()
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }
}

/// Status reported by the control plane for an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Accepted,
    Running,
    /// The resource may be attached when the provider returns it with the final status.
    Succeeded(Option<ResourceRecord>),
    Failed(ProvisioningError),
    Canceled,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded(_) | OperationStatus::Failed(_) | OperationStatus::Canceled
        )
    }

    pub fn state(&self) -> OperationState {
        match self {
            OperationStatus::Accepted => OperationState::Accepted,
            OperationStatus::Running => OperationState::Running,
            OperationStatus::Succeeded(_) => OperationState::Succeeded,
            OperationStatus::Failed(_) => OperationState::Failed,
            OperationStatus::Canceled => OperationState::Canceled,
        }
    }
}

/// Payload-free view of [`OperationStatus`], ordered along the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    Submitted,
    Accepted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::Failed | OperationState::Canceled
        )
    }

    fn rank(&self) -> u8 {
        match self {
            OperationState::Submitted => 0,
            OperationState::Accepted => 1,
            OperationState::Running => 2,
            OperationState::Succeeded | OperationState::Failed | OperationState::Canceled => 3,
        }
    }

    /// Whether moving from `self` to `next` goes forward.
    ///
    /// Staying in a non-terminal state is allowed (a poll may report the same
    /// status again); nothing leaves a terminal state.
    pub fn can_advance_to(&self, next: OperationState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }
}

/// Terminal result of waiting on a handle.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// A create or update finished; the record reflects the final state.
    Success(ResourceRecord),
    /// A delete finished.
    Deleted(ResourceId),
    Failure(ProvisioningError),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, OperationOutcome::Failure(_))
    }

    pub fn record(&self) -> Option<&ResourceRecord> {
        match self {
            OperationOutcome::Success(record) => Some(record),
            _ => None,
        }
    }

    /// Turns a failure into an error so callers can use `?`.
    pub fn into_result(self) -> Result<Self, ProvisioningError> {
        match self {
            OperationOutcome::Failure(e) => Err(e),
            other => Ok(other),
        }
    }
}
