//! # Azure Provision Demo
//!
//! Provisions a small environment end to end against the simulated control plane:
//!
//! 1. Load [`AzureConfig`] and resolve credentials (fatal if either is missing).
//! 2. Create the run's resource group.
//! 3. Create a virtual network with two subnets, a network security group and a subnet
//!    that references it.
//! 4. Create a storage account and read its primary key.
//! 5. Delete the resource group and shut down.
//!
//! ```bash
//! AZURE_SUBSCRIPTION_ID=00000000-0000-0000-0000-000000000000 \
//! AZURE_LOCATION=westeurope \
//! AZURE_TENANT_ID=tenant AZURE_CLIENT_ID=client AZURE_CLIENT_SECRET=secret \
//! RUST_LOG=info cargo run -p azure-provision
//! ```

use azure_provision::config::AzureConfig;
use azure_provision::credentials::EnvironmentCredentialProvider;
use azure_provision::lifecycle::{setup_tracing, ProvisioningSystem};
use provision_framework::simulator::SimulationProfile;
use std::collections::BTreeMap;
use std::error::Error;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    setup_tracing();

    let config = AzureConfig::from_env()?;
    let credentials = EnvironmentCredentialProvider::from_env();
    let system = ProvisioningSystem::start(config, &credentials, SimulationProfile::default())?;
    let ctx = system.context();
    let config = system.config.clone();

    let shutdown_ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, abandoning outstanding waits");
            shutdown_ctx.cancel();
        }
    });

    let group = system.resource_groups.create_configured_group(&ctx).await?;
    info!(id = %group.id, "Resource group ready");

    let tags = BTreeMap::from([("purpose".to_string(), "demo".to_string())]);
    let network_name = config.name("vnet");
    let span = tracing::info_span!("network", name = %network_name);
    let network = async {
        let network = system
            .networks
            .create_virtual_network_and_subnets(
                &network_name,
                "frontend",
                "backend",
                tags.clone(),
                &ctx,
            )
            .await?;
        system
            .networks
            .create_network_security_group(&config.name("nsg"), &ctx)
            .await?;
        system
            .subnets
            .create_subnet_with_network_security_group(
                &network_name,
                "secured",
                "10.2.0.0/16",
                &config.name("nsg"),
                &ctx,
            )
            .await?;
        Ok::<_, azure_provision::clients::NetworkError>(network)
    }
    .instrument(span)
    .await?;
    info!(id = %network.id, "Network ready");

    let account_name = config.name("store");
    match system
        .storage
        .create_storage_account(&account_name, &config.resource_group, tags, &ctx)
        .await
    {
        Ok(account) => {
            let key = system
                .storage
                .primary_key(&account_name, &config.resource_group)
                .await?;
            info!(id = %account.id, key_len = key.len(), "Storage account ready");
        }
        Err(e) => error!(error = %e, "Storage account creation failed"),
    }

    system.resource_groups.cleanup(&ctx).await?;
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
