//! # Network Client
//!
//! Virtual networks and network security groups in the configured resource group.
use crate::clients::{KindClient, SharedOrchestrator};
use crate::config::AzureConfig;
use crate::model::{
    self, NetworkSecurityGroupProperties, NetworkSecurityGroupSpec, SubnetSpec,
    VirtualNetworkSpec, DEFAULT_VNET_PREFIX, FIRST_SUBNET_PREFIX, SECOND_SUBNET_PREFIX,
};
use provision_framework::{
    CancellableContext, OperationHandle, OrchestratorError, RequestError, ResourceId,
    ResourceKind, ResourceRecord, ResourceRequest, SubmissionError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("cannot build request: {0}")]
    Spec(#[from] serde_json::Error),
    #[error("cannot start operation: {0}")]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Orchestration(#[from] OrchestratorError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },
}

/// Client for virtual networks and network security groups.
#[derive(Clone)]
pub struct NetworkClient {
    orchestrator: SharedOrchestrator,
    config: Arc<AzureConfig>,
}

impl KindClient for NetworkClient {
    type Error = NetworkError;

    fn orchestrator(&self) -> &SharedOrchestrator {
        &self.orchestrator
    }

    fn config(&self) -> &AzureConfig {
        &self.config
    }
}

impl NetworkClient {
    pub fn new(orchestrator: SharedOrchestrator, config: Arc<AzureConfig>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn virtual_network_id(&self, name: &str) -> ResourceId {
        ResourceId::new(
            self.config.subscription_id.clone(),
            self.config.resource_group.clone(),
            ResourceKind::VirtualNetwork,
            name,
        )
    }

    pub fn network_security_group_id(&self, name: &str) -> ResourceId {
        ResourceId::new(
            self.config.subscription_id.clone(),
            self.config.resource_group.clone(),
            ResourceKind::NetworkSecurityGroup,
            name,
        )
    }

    fn request(&self, kind: ResourceKind, name: &str) -> ResourceRequest {
        ResourceRequest::new(self.config.resource_group.clone(), name, kind)
            .with_location(self.config.location.clone())
    }

    /// Creates a virtual network with the `10.0.0.0/8` address space.
    #[instrument(skip(self, ctx))]
    pub async fn create_virtual_network(
        &self,
        name: &str,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, NetworkError> {
        let spec = VirtualNetworkSpec::new(&self.config.location, vec![DEFAULT_VNET_PREFIX.into()]);
        let request = self
            .request(ResourceKind::VirtualNetwork, name)
            .with_spec(model::to_spec(&spec)?);
        debug!("Sending request");
        let record = self.orchestrator.provision(&request, ctx).await?;
        info!(id = %record.id, "Virtual network created");
        Ok(record)
    }

    /// Creates a virtual network with two subnets, `10.0.0.0/16` and `10.1.0.0/16`.
    #[instrument(skip(self, tags, ctx))]
    pub async fn create_virtual_network_and_subnets(
        &self,
        name: &str,
        first_subnet: &str,
        second_subnet: &str,
        tags: BTreeMap<String, String>,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, NetworkError> {
        let spec = VirtualNetworkSpec::new(&self.config.location, vec![DEFAULT_VNET_PREFIX.into()])
            .with_subnet(SubnetSpec::new(FIRST_SUBNET_PREFIX).named(first_subnet))
            .with_subnet(SubnetSpec::new(SECOND_SUBNET_PREFIX).named(second_subnet));
        let request = self
            .request(ResourceKind::VirtualNetwork, name)
            .with_spec(model::to_spec(&spec)?)
            .with_tags(tags);
        debug!("Sending request");
        let record = self.orchestrator.provision(&request, ctx).await?;
        info!(id = %record.id, "Virtual network with subnets created");
        Ok(record)
    }

    /// Starts deleting a virtual network without waiting for it.
    #[instrument(skip(self))]
    pub async fn begin_delete_virtual_network(
        &self,
        name: &str,
    ) -> Result<OperationHandle, NetworkError> {
        Ok(self.orchestrator.delete(&self.virtual_network_id(name)).await?)
    }

    /// Deletes a virtual network and its subnets, waiting for completion.
    pub async fn delete_virtual_network(
        &self,
        name: &str,
        ctx: &CancellableContext,
    ) -> Result<(), NetworkError> {
        self.delete(&self.virtual_network_id(name), ctx).await
    }

    pub async fn get_virtual_network(
        &self,
        name: &str,
    ) -> Result<Option<ResourceRecord>, NetworkError> {
        self.get(&self.virtual_network_id(name)).await
    }

    /// Creates an empty network security group.
    #[instrument(skip(self, ctx))]
    pub async fn create_network_security_group(
        &self,
        name: &str,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, NetworkError> {
        let spec = NetworkSecurityGroupSpec {
            location: self.config.location.clone(),
            properties: NetworkSecurityGroupProperties::default(),
        };
        let request = self
            .request(ResourceKind::NetworkSecurityGroup, name)
            .with_spec(model::to_spec(&spec)?);
        debug!("Sending request");
        Ok(self.orchestrator.provision(&request, ctx).await?)
    }

    /// Returns an existing network security group, or `NotFound`.
    pub async fn get_network_security_group(
        &self,
        name: &str,
    ) -> Result<ResourceRecord, NetworkError> {
        self.get(&self.network_security_group_id(name))
            .await?
            .ok_or_else(|| NetworkError::NotFound {
                kind: ResourceKind::NetworkSecurityGroup,
                name: name.to_string(),
            })
    }
}
