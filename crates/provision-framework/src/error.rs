//! # Provisioning Errors
//!
//! This module defines the error taxonomy shared by the orchestrator and every
//! [`CloudResourceClient`](crate::CloudResourceClient) implementation. Each stage
//! of an operation's life has its own type, so callers can tell a synchronous
//! rejection from a failed operation or an abandoned wait.

use std::fmt;

/// The request was rejected before any long-running operation started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("name [{name}] not available: {message}")]
    NameUnavailable { name: String, message: String },
    #[error("invalid resource spec: {0}")]
    InvalidSpec(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("control plane unreachable")]
    Unreachable,
}

/// Checking the status of an in-flight operation failed.
///
/// These are I/O level failures. Retrying them is the collaborator's job
/// (see [`RetryingClient`](crate::RetryingClient)); the orchestrator only
/// surfaces them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollingError {
    #[error("transient failure polling {operation_id}: {message}")]
    Transient {
        operation_id: String,
        message: String,
    },
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("control plane unreachable")]
    Unreachable,
}

impl PollingError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(self, PollingError::Transient { .. } | PollingError::Unreachable)
    }
}

/// A synchronous read or resource action failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("unsupported action '{action}' on {resource}")]
    UnsupportedAction { resource: String, action: String },
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("control plane unreachable")]
    Unreachable,
}

/// Classification of a failed terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    NotFound,
    Conflict,
    Canceled,
    Internal,
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            FailureCode::NotFound => "NotFound",
            FailureCode::Conflict => "Conflict",
            FailureCode::Canceled => "Canceled",
            FailureCode::Internal => "InternalError",
        };
        f.write_str(code)
    }
}

/// The operation reached a Failed (or remotely Canceled) terminal state.
///
/// Carries the provider's diagnostic message unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("provisioning failed ({code}): {message}")]
pub struct ProvisioningError {
    pub code: FailureCode,
    pub message: String,
}

impl ProvisioningError {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureCode::NotFound, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(FailureCode::Canceled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureCode::Internal, message)
    }
}

/// The caller stopped waiting. The remote operation keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextCanceledError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors from [`ProvisioningOrchestrator::await_completion`](crate::ProvisioningOrchestrator::await_completion).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error(transparent)]
    Canceled(#[from] ContextCanceledError),
    #[error(transparent)]
    Polling(#[from] PollingError),
    #[error("could not fetch the provisioned resource: {0}")]
    Fetch(#[from] RequestError),
}

/// Flattened error for the submit-and-wait conveniences.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl OrchestratorError {
    /// The terminal failure, if the operation itself failed.
    pub fn provisioning(&self) -> Option<&ProvisioningError> {
        match self {
            OrchestratorError::Provisioning(e) => Some(e),
            _ => None,
        }
    }
}
