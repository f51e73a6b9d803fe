//! Retry utilities with exponential backoff and jitter.
//!
//! Transient status-check failures belong to the collaborator layer, not the
//! orchestrator. [`RetryingClient`] wraps any [`CloudResourceClient`] and retries
//! `poll_status` and `get` with [`retry_with_backoff`]; submissions are passed
//! through untouched so a rejected request is never sent twice.

use crate::cloud_client::{CloudResourceClient, NameAvailability};
use crate::error::{PollingError, RequestError, SubmissionError};
use crate::request::{OperationHandle, OperationStatus, ResourceRequest};
use crate::resource::{ResourceId, ResourceKind, ResourceRecord};
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};

/// Backoff settings for transient failures.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts (0 = infinite)
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or attempts run out.
///
/// `is_retryable` decides which errors are worth another attempt. Delays grow by
/// `backoff_multiplier` up to `max_delay`, each scaled by 0.5x to 1.5x jitter.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_retryable(&e) => return Err(e),
            Err(e) => {
                if config.max_attempts > 0 && attempt >= config.max_attempts {
                    error!(
                        operation = %operation_name,
                        attempt,
                        error = %e,
                        "Operation failed after max retries"
                    );
                    return Err(e);
                }

                let jitter = rand::thread_rng().gen_range(0.5..1.5);
                let jittered_delay = Duration::from_secs_f64(delay.as_secs_f64() * jitter);

                warn!(
                    operation = %operation_name,
                    attempt,
                    error = %e,
                    delay_ms = jittered_delay.as_millis() as u64,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(jittered_delay).await;

                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
            }
        }
    }
}

/// Decorator that retries transient read failures of the wrapped client.
#[derive(Clone, Debug)]
pub struct RetryingClient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: CloudResourceClient> RetryingClient<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

fn request_is_transient(e: &RequestError) -> bool {
    matches!(e, RequestError::Unreachable)
}

#[async_trait]
impl<C: CloudResourceClient> CloudResourceClient for RetryingClient<C> {
    async fn check_name_availability(
        &self,
        kind: ResourceKind,
        resource_group: &str,
        name: &str,
    ) -> Result<NameAvailability, SubmissionError> {
        self.inner
            .check_name_availability(kind, resource_group, name)
            .await
    }

    async fn create_or_update(
        &self,
        request: &ResourceRequest,
    ) -> Result<OperationHandle, SubmissionError> {
        self.inner.create_or_update(request).await
    }

    async fn delete(&self, id: &ResourceId) -> Result<OperationHandle, SubmissionError> {
        self.inner.delete(id).await
    }

    async fn get(&self, id: &ResourceId) -> Result<Option<ResourceRecord>, RequestError> {
        retry_with_backoff(&self.config, "get", request_is_transient, || {
            self.inner.get(id)
        })
        .await
    }

    async fn poll_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, PollingError> {
        retry_with_backoff(&self.config, "poll_status", PollingError::is_transient, || {
            self.inner.poll_status(handle)
        })
        .await
    }

    async fn invoke(&self, id: &ResourceId, action: &str) -> Result<Value, RequestError> {
        self.inner.invoke(id, action).await
    }

    fn poll_interval(&self, handle: &OperationHandle) -> Duration {
        self.inner.poll_interval(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, PollingError> = retry_with_backoff(
            &RetryConfig::with_max_attempts(5),
            "flaky",
            PollingError::is_transient,
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(PollingError::Unreachable)
                } else {
                    Ok(n)
                }
            },
        )
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PollingError> = retry_with_backoff(
            &RetryConfig::default(),
            "unknown",
            PollingError::is_transient,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PollingError::UnknownOperation("op-9".into()))
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PollingError> = retry_with_backoff(
            &RetryConfig::with_max_attempts(3),
            "down",
            PollingError::is_transient,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PollingError::Unreachable)
            },
        )
        .await;
        assert_eq!(result, Err(PollingError::Unreachable));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
