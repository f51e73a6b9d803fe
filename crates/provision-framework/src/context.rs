//! Cooperative cancellation for waits.

use crate::error::ContextCanceledError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus an optional deadline, passed to every wait.
///
/// Cloning shares the token: canceling any clone cancels all of them. Use
/// [`child`](Self::child) to derive a context that can be canceled on its own.
#[derive(Debug, Clone, Default)]
pub struct CancellableContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancellableContext {
    /// A context that is never canceled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// Bounds this context by `timeout` from now, keeping any earlier deadline.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derives a context that is canceled with its parent but can also be
    /// canceled independently.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why this context is done, or `None` if it is still live.
    pub fn err(&self) -> Option<ContextCanceledError> {
        if self.token.is_cancelled() {
            return Some(ContextCanceledError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Some(ContextCanceledError::DeadlineExceeded)
            }
            _ => None,
        }
    }

    /// Resolves once the context is canceled or its deadline passes.
    pub async fn done(&self) -> ContextCanceledError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ContextCanceledError::Canceled,
                _ = tokio::time::sleep_until(deadline) => ContextCanceledError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextCanceledError::Canceled
            }
        }
    }
}
