//! # Resource Group Client
//!
//! Groups scope every other resource; deleting one removes everything inside it.
use crate::clients::{KindClient, SharedOrchestrator};
use crate::config::AzureConfig;
use provision_framework::{
    CancellableContext, OrchestratorError, RequestError, ResourceId, ResourceKind,
    ResourceRecord, ResourceRequest,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ResourceGroupError {
    #[error(transparent)]
    Orchestration(#[from] OrchestratorError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Client for resource groups.
#[derive(Clone)]
pub struct ResourceGroupClient {
    orchestrator: SharedOrchestrator,
    config: Arc<AzureConfig>,
}

impl KindClient for ResourceGroupClient {
    type Error = ResourceGroupError;

    fn orchestrator(&self) -> &SharedOrchestrator {
        &self.orchestrator
    }

    fn config(&self) -> &AzureConfig {
        &self.config
    }
}

impl ResourceGroupClient {
    pub fn new(orchestrator: SharedOrchestrator, config: Arc<AzureConfig>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn group_id(&self, name: &str) -> ResourceId {
        ResourceId::resource_group(self.config.subscription_id.clone(), name)
    }

    /// Creates (or updates) a group in the configured location.
    #[instrument(skip(self, tags, ctx))]
    pub async fn create_group(
        &self,
        name: &str,
        tags: BTreeMap<String, String>,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, ResourceGroupError> {
        let request = ResourceRequest::new(name, name, ResourceKind::ResourceGroup)
            .with_location(self.config.location.clone())
            .with_tags(tags);
        let record = self.orchestrator.provision(&request, ctx).await?;
        info!(id = %record.id, "Resource group created");
        Ok(record)
    }

    /// Creates the group named in the config.
    pub async fn create_configured_group(
        &self,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, ResourceGroupError> {
        self.create_group(&self.config.resource_group, BTreeMap::new(), ctx)
            .await
    }

    pub async fn get_group(&self, name: &str) -> Result<Option<ResourceRecord>, ResourceGroupError> {
        self.get(&self.group_id(name)).await
    }

    /// Deletes a group and everything in it.
    pub async fn delete_group(
        &self,
        name: &str,
        ctx: &CancellableContext,
    ) -> Result<(), ResourceGroupError> {
        self.delete(&self.group_id(name), ctx).await
    }

    /// Deletes the group created for this run.
    #[instrument(skip(self, ctx), fields(group = %self.config.resource_group))]
    pub async fn cleanup(&self, ctx: &CancellableContext) -> Result<(), ResourceGroupError> {
        info!("Deleting resources");
        self.delete_group(&self.config.resource_group, ctx).await
    }
}
