//! # Clients
//!
//! Domain-specific wrappers over the shared [`ProvisioningOrchestrator`]. Each client
//! knows how to build the request for its resource kinds and maps failures into its
//! own error type; the common reads and deletes come from [`KindClient`].

pub mod kind_client;
pub mod network_client;
pub mod resource_group_client;
pub mod storage_client;
pub mod subnet_client;

pub use kind_client::KindClient;
pub use network_client::{NetworkClient, NetworkError};
pub use resource_group_client::{ResourceGroupClient, ResourceGroupError};
pub use storage_client::{StorageClient, StorageError};
pub use subnet_client::SubnetClient;

use provision_framework::{CloudResourceClient, ProvisioningOrchestrator};
use std::sync::Arc;

/// Control plane shared by every client.
pub type SharedCloud = Arc<dyn CloudResourceClient>;

/// Orchestrator shared by every client.
pub type SharedOrchestrator = ProvisioningOrchestrator<SharedCloud>;
