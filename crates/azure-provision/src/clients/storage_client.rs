//! # Storage Client
//!
//! Storage accounts and their access keys. Account names are global across all
//! subscriptions, so creation goes through a name-availability check first.
use crate::clients::{KindClient, SharedOrchestrator};
use crate::config::AzureConfig;
use crate::model::{self, AccountKeys, StorageAccountSpec};
use provision_framework::{
    CancellableContext, CloudResourceClient, NameAvailability, OrchestratorError, RequestError,
    ResourceId, ResourceKind, ResourceRecord, ResourceRequest, SubmissionError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

const LIST_KEYS_ACTION: &str = "listKeys";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage account name [{name}] not available: {message}")]
    NameUnavailable { name: String, message: String },
    #[error("cannot build request: {0}")]
    Spec(#[source] serde_json::Error),
    #[error("storage account check-name-availability failed: {0}")]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Orchestration(OrchestratorError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("failed to list keys: {0}")]
    InvalidKeys(#[source] serde_json::Error),
    #[error("storage account '{0}' has no keys")]
    NoKeys(String),
}

impl From<OrchestratorError> for StorageError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Submission(SubmissionError::NameUnavailable { name, message }) => {
                StorageError::NameUnavailable { name, message }
            }
            other => StorageError::Orchestration(other),
        }
    }
}

/// Client for storage accounts.
#[derive(Clone)]
pub struct StorageClient {
    orchestrator: SharedOrchestrator,
    config: Arc<AzureConfig>,
}

impl KindClient for StorageClient {
    type Error = StorageError;

    fn orchestrator(&self) -> &SharedOrchestrator {
        &self.orchestrator
    }

    fn config(&self) -> &AzureConfig {
        &self.config
    }
}

impl StorageClient {
    pub fn new(orchestrator: SharedOrchestrator, config: Arc<AzureConfig>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn account_id(&self, name: &str, group: &str) -> ResourceId {
        ResourceId::new(
            self.config.subscription_id.clone(),
            group,
            ResourceKind::StorageAccount,
            name,
        )
    }

    /// Asks the control plane whether `name` can be used in `group`.
    #[instrument(skip(self))]
    pub async fn check_name_availability(
        &self,
        name: &str,
        group: &str,
    ) -> Result<NameAvailability, StorageError> {
        Ok(self
            .orchestrator
            .client()
            .check_name_availability(ResourceKind::StorageAccount, group, name)
            .await?)
    }

    /// Creates a Standard_LRS, HTTPS-only account and waits for it.
    #[instrument(skip(self, tags, ctx))]
    pub async fn create_storage_account(
        &self,
        name: &str,
        group: &str,
        tags: BTreeMap<String, String>,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, StorageError> {
        let spec = StorageAccountSpec::standard_lrs(&self.config.location);
        let request = ResourceRequest::new(group, name, ResourceKind::StorageAccount)
            .with_location(self.config.location.clone())
            .with_spec(model::to_spec(&spec).map_err(StorageError::Spec)?)
            .with_tags(tags);
        debug!("Sending request");
        let record = self.orchestrator.provision(&request, ctx).await.map_err(|e| {
            warn!(error = %e, "Storage account creation failed");
            StorageError::from(e)
        })?;
        info!(id = %record.id, "Storage account created");
        Ok(record)
    }

    pub async fn delete_storage_account(
        &self,
        name: &str,
        group: &str,
        ctx: &CancellableContext,
    ) -> Result<(), StorageError> {
        self.delete(&self.account_id(name, group), ctx).await
    }

    /// Lists the access keys of an account.
    #[instrument(skip(self))]
    pub async fn list_keys(&self, name: &str, group: &str) -> Result<AccountKeys, StorageError> {
        let value = self
            .orchestrator
            .client()
            .invoke(&self.account_id(name, group), LIST_KEYS_ACTION)
            .await?;
        serde_json::from_value(value).map_err(StorageError::InvalidKeys)
    }

    /// Returns the value of the first access key.
    pub async fn primary_key(&self, name: &str, group: &str) -> Result<String, StorageError> {
        let keys = self.list_keys(name, group).await?;
        keys.primary()
            .map(|key| key.value.clone())
            .ok_or_else(|| StorageError::NoKeys(name.to_string()))
    }
}
