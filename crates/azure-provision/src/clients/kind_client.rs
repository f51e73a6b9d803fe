use crate::clients::SharedOrchestrator;
use crate::config::AzureConfig;
use async_trait::async_trait;
use provision_framework::{
    CancellableContext, OrchestratorError, RequestError, ResourceId, ResourceRecord,
};

/// Trait for resource-specific clients to inherit the common reads and deletes.
///
/// Implementors supply the orchestrator, the config and an error type; `get` and
/// `delete` come for free.
///
/// # Example
///
/// ```rust
/// use azure_provision::clients::{KindClient, SharedOrchestrator};
/// use azure_provision::config::AzureConfig;
/// use provision_framework::{OrchestratorError, RequestError};
///
/// #[derive(Debug, thiserror::Error)]
/// enum DnsError {
///     #[error(transparent)]
///     Orchestration(#[from] OrchestratorError),
///     #[error(transparent)]
///     Request(#[from] RequestError),
/// }
///
/// struct DnsClient {
///     orchestrator: SharedOrchestrator,
///     config: AzureConfig,
/// }
///
/// impl KindClient for DnsClient {
///     type Error = DnsError;
///
///     fn orchestrator(&self) -> &SharedOrchestrator {
///         &self.orchestrator
///     }
///
///     fn config(&self) -> &AzureConfig {
///         &self.config
///     }
/// }
/// ```
#[async_trait]
pub trait KindClient: Send + Sync {
    /// The area-specific error type.
    type Error: From<OrchestratorError> + From<RequestError> + Send;

    fn orchestrator(&self) -> &SharedOrchestrator;

    fn config(&self) -> &AzureConfig;

    /// Fetch a resource by id. `Ok(None)` when it does not exist.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    async fn get(&self, id: &ResourceId) -> Result<Option<ResourceRecord>, Self::Error> {
        tracing::debug!("Sending request");
        self.orchestrator().get(id).await.map_err(Into::into)
    }

    /// Delete a resource by id and wait for the deletion to finish.
    #[tracing::instrument(skip(self, id, ctx), fields(id = %id))]
    async fn delete(&self, id: &ResourceId, ctx: &CancellableContext) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.orchestrator().remove(id, ctx).await.map_err(Into::into)
    }
}
