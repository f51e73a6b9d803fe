//! # Subnet Client
//!
//! Subnets live inside a virtual network, so every operation takes both names.
use crate::clients::{KindClient, NetworkError, SharedOrchestrator};
use crate::config::AzureConfig;
use crate::model::{self, SubnetSpec, FIRST_SUBNET_PREFIX};
use provision_framework::{
    CancellableContext, ResourceId, ResourceKind, ResourceRecord, ResourceRequest,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Client for subnets of existing virtual networks.
#[derive(Clone)]
pub struct SubnetClient {
    orchestrator: SharedOrchestrator,
    config: Arc<AzureConfig>,
}

impl KindClient for SubnetClient {
    type Error = NetworkError;

    fn orchestrator(&self) -> &SharedOrchestrator {
        &self.orchestrator
    }

    fn config(&self) -> &AzureConfig {
        &self.config
    }
}

impl SubnetClient {
    pub fn new(orchestrator: SharedOrchestrator, config: Arc<AzureConfig>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn subnet_id(&self, network: &str, subnet: &str) -> ResourceId {
        ResourceId::child(
            self.config.subscription_id.clone(),
            self.config.resource_group.clone(),
            ResourceKind::Subnet,
            network,
            subnet,
        )
    }

    async fn create(
        &self,
        network: &str,
        subnet: &str,
        spec: SubnetSpec,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, NetworkError> {
        let request = ResourceRequest::new(
            self.config.resource_group.clone(),
            subnet,
            ResourceKind::Subnet,
        )
        .with_parent(network)
        .with_spec(model::to_spec(&spec)?);
        debug!("Sending request");
        let record = self.orchestrator.provision(&request, ctx).await?;
        info!(id = %record.id, "Subnet created");
        Ok(record)
    }

    /// Creates a `10.0.0.0/16` subnet in an existing virtual network.
    #[instrument(skip(self, ctx))]
    pub async fn create_subnet(
        &self,
        network: &str,
        subnet: &str,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, NetworkError> {
        self.create(network, subnet, SubnetSpec::new(FIRST_SUBNET_PREFIX), ctx)
            .await
    }

    /// Creates a subnet that references an existing network security group.
    ///
    /// The group is looked up first; a missing group fails before anything is submitted.
    #[instrument(skip(self, ctx))]
    pub async fn create_subnet_with_network_security_group(
        &self,
        network: &str,
        subnet: &str,
        address_prefix: &str,
        security_group: &str,
        ctx: &CancellableContext,
    ) -> Result<ResourceRecord, NetworkError> {
        let nsg_id = ResourceId::new(
            self.config.subscription_id.clone(),
            self.config.resource_group.clone(),
            ResourceKind::NetworkSecurityGroup,
            security_group,
        );
        let nsg = self
            .get(&nsg_id)
            .await?
            .ok_or_else(|| NetworkError::NotFound {
                kind: ResourceKind::NetworkSecurityGroup,
                name: security_group.to_string(),
            })?;

        let spec =
            SubnetSpec::new(address_prefix).with_network_security_group(nsg.id.to_string());
        self.create(network, subnet, spec, ctx).await
    }

    pub async fn get_subnet(
        &self,
        network: &str,
        subnet: &str,
    ) -> Result<Option<ResourceRecord>, NetworkError> {
        self.get(&self.subnet_id(network, subnet)).await
    }

    pub async fn delete_subnet(
        &self,
        network: &str,
        subnet: &str,
        ctx: &CancellableContext,
    ) -> Result<(), NetworkError> {
        self.delete(&self.subnet_id(network, subnet), ctx).await
    }
}
