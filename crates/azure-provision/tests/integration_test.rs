use azure_provision::clients::{NetworkError, StorageError};
use azure_provision::config::AzureConfig;
use azure_provision::credentials::{AuthResolutionError, EnvironmentCredentialProvider};
use azure_provision::lifecycle::{ProvisioningSystem, SystemError};
use provision_framework::simulator::SimulationProfile;
use provision_framework::{ContextCanceledError, FailureCode, OperationOutcome};
use std::collections::{BTreeMap, HashMap};

fn config() -> AzureConfig {
    let vars = HashMap::from([
        ("AZURE_SUBSCRIPTION_ID", "00000000-0000-0000-0000-000000000001"),
        ("AZURE_LOCATION", "westeurope"),
    ]);
    AzureConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("config should load")
}

fn credentials() -> EnvironmentCredentialProvider {
    EnvironmentCredentialProvider::with_lookup(|key| match key {
        "AZURE_TENANT_ID" => Some("tenant".to_string()),
        "AZURE_CLIENT_ID" => Some("client".to_string()),
        "AZURE_CLIENT_SECRET" => Some("secret".to_string()),
        _ => None,
    })
}

fn start() -> ProvisioningSystem {
    ProvisioningSystem::start(config(), &credentials(), SimulationProfile::default())
        .expect("system should start")
}

/// Full end-to-end run: group, network with subnets, security group, secured subnet,
/// storage account with keys, then cleanup.
#[tokio::test(start_paused = true)]
async fn test_full_provisioning_flow() {
    let system = start();
    let ctx = system.context();
    let config = system.config.clone();

    system
        .resource_groups
        .create_configured_group(&ctx)
        .await
        .expect("Failed to create group");

    let vnet_name = config.name("vnet");
    let tags = BTreeMap::from([("env".to_string(), "test".to_string())]);
    let network = system
        .networks
        .create_virtual_network_and_subnets(&vnet_name, "subnet-1", "subnet-2", tags.clone(), &ctx)
        .await
        .expect("Failed to create network");
    assert_eq!(network.tags, tags);

    let second = system
        .subnets
        .get_subnet(&vnet_name, "subnet-2")
        .await
        .unwrap()
        .expect("Inline subnet not found");
    assert_eq!(
        second.property("addressPrefix").and_then(|v| v.as_str()),
        Some("10.1.0.0/16")
    );

    let nsg = system
        .networks
        .create_network_security_group("nsg-1", &ctx)
        .await
        .expect("Failed to create nsg");
    let secured = system
        .subnets
        .create_subnet_with_network_security_group(&vnet_name, "secured", "10.2.0.0/16", "nsg-1", &ctx)
        .await
        .expect("Failed to create secured subnet");
    assert_eq!(
        secured
            .property("networkSecurityGroup/id")
            .and_then(|v| v.as_str()),
        Some(nsg.id.to_string().as_str())
    );

    let account = config.name("store");
    system
        .storage
        .create_storage_account(&account, &config.resource_group, tags, &ctx)
        .await
        .expect("Failed to create storage account");
    let keys = system
        .storage
        .list_keys(&account, &config.resource_group)
        .await
        .unwrap();
    assert_eq!(keys.keys.len(), 2);
    let primary = system
        .storage
        .primary_key(&account, &config.resource_group)
        .await
        .unwrap();
    assert_eq!(primary, keys.keys[0].value);

    system.resource_groups.cleanup(&ctx).await.expect("Cleanup failed");
    assert!(system
        .resource_groups
        .get_group(&config.resource_group)
        .await
        .unwrap()
        .is_none());
    assert!(system.networks.get_virtual_network(&vnet_name).await.unwrap().is_none());

    system.shutdown().await.expect("Shutdown failed");
}

#[tokio::test]
async fn test_start_without_credentials_fails() {
    let no_credentials = EnvironmentCredentialProvider::with_lookup(|_| None);
    let result = ProvisioningSystem::start(config(), &no_credentials, SimulationProfile::instant());
    assert!(matches!(
        result,
        Err(SystemError::Auth(AuthResolutionError::NoCredentials))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_storage_names_are_global() {
    let system = start();
    let ctx = system.context();
    system.resource_groups.create_group("rg-a", BTreeMap::new(), &ctx).await.unwrap();
    system.resource_groups.create_group("rg-b", BTreeMap::new(), &ctx).await.unwrap();

    system
        .storage
        .create_storage_account("shared001", "rg-a", BTreeMap::new(), &ctx)
        .await
        .unwrap();

    let availability = system
        .storage
        .check_name_availability("shared001", "rg-b")
        .await
        .unwrap();
    assert!(!availability.available);
    assert_eq!(availability.reason.as_deref(), Some("AlreadyExists"));

    let err = system
        .storage
        .create_storage_account("shared001", "rg-b", BTreeMap::new(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NameUnavailable { ref name, .. } if name == "shared001"));

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_begin_delete_returns_handle_without_waiting() {
    let system = start();
    let ctx = system.context();
    system.resource_groups.create_configured_group(&ctx).await.unwrap();
    system.networks.create_virtual_network("vnet-a", &ctx).await.unwrap();

    let handle = system
        .networks
        .begin_delete_virtual_network("vnet-a")
        .await
        .unwrap();
    let id = handle.resource_id().clone();
    let outcome = system.orchestrator.await_completion(handle, &ctx).await.unwrap();

    assert_eq!(outcome, OperationOutcome::Deleted(id));
    assert!(system.networks.get_virtual_network("vnet-a").await.unwrap().is_none());
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_deleting_missing_network_reports_not_found() {
    let system = start();
    let ctx = system.context();
    system.resource_groups.create_configured_group(&ctx).await.unwrap();

    let err = system
        .networks
        .delete_virtual_network("ghost", &ctx)
        .await
        .unwrap_err();
    match err {
        NetworkError::Orchestration(e) => {
            assert_eq!(e.provisioning().map(|p| p.code), Some(FailureCode::NotFound));
        }
        other => panic!("expected orchestration error, got {other:?}"),
    }
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_injected_failure_surfaces_provider_message() {
    let system = start();
    let ctx = system.context();
    system.resource_groups.create_configured_group(&ctx).await.unwrap();
    system
        .cloud
        .inject_failure("vnet-q", "quota exceeded for region")
        .await
        .unwrap();

    let err = system
        .networks
        .create_virtual_network("vnet-q", &ctx)
        .await
        .unwrap_err();
    let NetworkError::Orchestration(e) = err else {
        panic!("expected orchestration error");
    };
    let failure = e.provisioning().expect("terminal failure");
    assert_eq!(failure.message, "quota exceeded for region");
    assert!(system.networks.get_virtual_network("vnet-q").await.unwrap().is_none());

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_subnet_delete_leaves_network() {
    let system = start();
    let ctx = system.context();
    system.resource_groups.create_configured_group(&ctx).await.unwrap();
    system.networks.create_virtual_network("vnet-a", &ctx).await.unwrap();
    system.subnets.create_subnet("vnet-a", "subnet-1", &ctx).await.unwrap();

    system.subnets.delete_subnet("vnet-a", "subnet-1", &ctx).await.unwrap();

    assert!(system.subnets.get_subnet("vnet-a", "subnet-1").await.unwrap().is_none());
    assert!(system.networks.get_virtual_network("vnet-a").await.unwrap().is_some());
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_outstanding_contexts() {
    let system = start();
    let ctx = system.context();
    assert!(ctx.err().is_none());

    system.shutdown().await.unwrap();
    assert_eq!(ctx.err(), Some(ContextCanceledError::Canceled));
}
