use crate::clients::{
    NetworkClient, ResourceGroupClient, SharedCloud, SharedOrchestrator, StorageClient,
    SubnetClient,
};
use crate::config::AzureConfig;
use crate::credentials::{AuthResolutionError, CredentialProvider};
use provision_framework::simulator::{SimulatedCloud, SimulatedCloudClient, SimulationProfile};
use provision_framework::{CancellableContext, RetryConfig, RetryingClient};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Auth(#[from] AuthResolutionError),
    #[error("control plane task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The running system: the control plane task plus every client wired to it.
pub struct ProvisioningSystem {
    pub config: Arc<AzureConfig>,
    pub orchestrator: SharedOrchestrator,
    pub resource_groups: ResourceGroupClient,
    pub networks: NetworkClient,
    pub subnets: SubnetClient,
    pub storage: StorageClient,
    /// Direct handle on the control plane, for failure injection.
    pub cloud: SimulatedCloudClient,
    root: CancellableContext,
    handle: JoinHandle<()>,
}

impl ProvisioningSystem {
    /// Resolves credentials, starts the control plane and builds every client.
    ///
    /// Fails before anything is spawned if no credential can be resolved.
    pub fn start(
        config: AzureConfig,
        credentials: &dyn CredentialProvider,
        profile: SimulationProfile,
    ) -> Result<Self, SystemError> {
        let token = credentials.resolve_authorizer()?;
        let config = Arc::new(config);

        let (cloud, client) = SimulatedCloud::new(config.subscription_id.clone(), profile);
        let handle = tokio::spawn(cloud.run());
        let cloud = client.authorized(token.secret());

        let shared: SharedCloud = Arc::new(RetryingClient::new(cloud.clone(), RetryConfig::default()));
        let orchestrator = SharedOrchestrator::new(shared);

        info!(
            subscription_id = %config.subscription_id,
            resource_group = %config.resource_group,
            location = %config.location,
            source = ?token.source(),
            "Provisioning system started"
        );

        Ok(Self {
            resource_groups: ResourceGroupClient::new(orchestrator.clone(), config.clone()),
            networks: NetworkClient::new(orchestrator.clone(), config.clone()),
            subnets: SubnetClient::new(orchestrator.clone(), config.clone()),
            storage: StorageClient::new(orchestrator.clone(), config.clone()),
            orchestrator,
            config,
            cloud,
            root: CancellableContext::new(),
            handle,
        })
    }

    /// A context that is canceled when the system shuts down.
    pub fn context(&self) -> CancellableContext {
        self.root.child()
    }

    /// Abandons outstanding waits, closes every client and waits for the control
    /// plane to stop.
    ///
    /// Clones of the clients held elsewhere keep the control plane alive; drop them first.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down provisioning system");
        let Self {
            config: _,
            orchestrator,
            resource_groups,
            networks,
            subnets,
            storage,
            cloud,
            root,
            handle,
        } = self;

        root.cancel();
        drop((orchestrator, resource_groups, networks, subnets, storage, cloud));

        handle.await?;
        info!("Provisioning system stopped");
        Ok(())
    }
}
