use provision_framework::mock::MockCloud;
use provision_framework::simulator::{SimulatedCloud, SimulatedCloudClient, SimulationProfile};
use provision_framework::{
    CancellableContext, CloudResourceClient, ContextCanceledError, FailureCode, OperationHandle,
    OperationKind, OperationOutcome, OperationState, OperationStatus, PollingError,
    ProvisioningOrchestrator, RequestError, ResourceId, ResourceKind, ResourceRecord,
    ResourceRequest, RetryConfig, RetryingClient, SubmissionError, WaitError,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

// --- Helpers ---

fn start(
    profile: SimulationProfile,
) -> (ProvisioningOrchestrator<SimulatedCloudClient>, SimulatedCloudClient) {
    let (cloud, client) = SimulatedCloud::new("sub-1", profile);
    tokio::spawn(cloud.run());
    let client = client.authorized("test-token");
    (ProvisioningOrchestrator::new(client.clone()), client)
}

fn slow_profile() -> SimulationProfile {
    SimulationProfile {
        accept_delay: Duration::from_secs(1),
        completion_delay: Duration::from_secs(10),
        poll_interval: Duration::from_secs(1),
        ..SimulationProfile::default()
    }
}

fn vnet(group: &str, name: &str, prefix: &str) -> ResourceRequest {
    ResourceRequest::new(group, name, ResourceKind::VirtualNetwork).with_spec(json!({
        "properties": { "addressSpace": { "addressPrefixes": [prefix] } }
    }))
}

async fn create_group<C: CloudResourceClient>(orchestrator: &ProvisioningOrchestrator<C>, name: &str) {
    let request = ResourceRequest::new(name, name, ResourceKind::ResourceGroup);
    orchestrator
        .provision(&request, &CancellableContext::new())
        .await
        .expect("resource group should provision");
}

// --- Tests ---

#[tokio::test(start_paused = true)]
async fn test_vnet_reaches_succeeded_through_every_state() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;

    let handle = orchestrator.submit(&vnet("rg-1", "vnet-a", "10.0.0.0/8")).await.unwrap();
    let (outcome, tracker) = orchestrator
        .await_with_history(handle, &CancellableContext::new())
        .await
        .unwrap();

    let record = outcome.record().expect("success carries a record").clone();
    assert_eq!(record.name, "vnet-a");
    assert_eq!(record.id.group(), "rg-1");
    assert_eq!(record.provisioning_state(), Some("Succeeded"));
    assert_eq!(
        record.property("addressSpace/addressPrefixes"),
        Some(&json!(["10.0.0.0/8"]))
    );
    assert_eq!(
        tracker.history(),
        &[
            OperationState::Submitted,
            OperationState::Accepted,
            OperationState::Running,
            OperationState::Succeeded,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_operation_leaves_no_record() {
    let (orchestrator, client) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;
    client.inject_failure("vnet-b", "quota exceeded").await.unwrap();

    let request = vnet("rg-1", "vnet-b", "10.0.0.0/8");
    let handle = orchestrator.submit(&request).await.unwrap();
    let outcome = orchestrator
        .await_completion(handle, &CancellableContext::new())
        .await
        .unwrap();

    match outcome {
        OperationOutcome::Failure(e) => {
            assert_eq!(e.code, FailureCode::Internal);
            assert_eq!(e.message, "quota exceeded");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let id = request.resource_id("sub-1");
    assert!(orchestrator.get(&id).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_canceled_wait_returns_within_one_interval_and_work_continues() {
    let (orchestrator, _) = start(slow_profile());
    create_group(&orchestrator, "rg-1").await;

    let request = vnet("rg-1", "vnet-slow", "10.0.0.0/8");
    let handle = orchestrator.submit(&request).await.unwrap();

    let ctx = CancellableContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let result = orchestrator.await_completion(handle, &ctx).await;
    let waited = started.elapsed();

    assert_eq!(result, Err(WaitError::Canceled(ContextCanceledError::Canceled)));
    assert!(waited <= Duration::from_millis(3500), "waited {waited:?}");

    // the remote operation was not canceled
    tokio::time::sleep(Duration::from_secs(10)).await;
    let record = orchestrator.get(&request.resource_id("sub-1")).await.unwrap();
    assert_eq!(record.map(|r| r.name), Some("vnet-slow".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_abandons_wait() {
    let (orchestrator, _) = start(slow_profile());
    create_group(&orchestrator, "rg-1").await;

    let handle = orchestrator.submit(&vnet("rg-1", "vnet-late", "10.0.0.0/8")).await.unwrap();
    let ctx = CancellableContext::with_timeout(Duration::from_secs(3));
    let result = orchestrator.await_completion(handle, &ctx).await;

    assert_eq!(
        result,
        Err(WaitError::Canceled(ContextCanceledError::DeadlineExceeded))
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_waits_do_not_cross_contaminate() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;

    let mut tasks = Vec::new();
    for i in 0..5 {
        let orchestrator = orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            let request = vnet("rg-1", &format!("vnet-{i}"), &format!("10.{i}.0.0/16"));
            let record = orchestrator
                .provision(&request, &CancellableContext::new())
                .await
                .unwrap();
            (i, record)
        }));
    }

    for task in tasks {
        let (i, record) = task.await.unwrap();
        assert_eq!(record.name, format!("vnet-{i}"));
        assert_eq!(
            record.property("addressSpace/addressPrefixes"),
            Some(&json!([format!("10.{i}.0.0/16")]))
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_identical_requests_are_idempotent() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;
    let request = vnet("rg-1", "vnet-a", "10.0.0.0/8").with_tag("env", "test");
    let ctx = CancellableContext::new();

    let first = orchestrator.provision(&request, &ctx).await.unwrap();
    let second = orchestrator.provision(&request, &ctx).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.tags.get("env").map(String::as_str), Some("test"));
}

#[tokio::test(start_paused = true)]
async fn test_storage_name_collision_is_a_submission_error() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-a").await;
    create_group(&orchestrator, "rg-b").await;
    let ctx = CancellableContext::new();

    let first = ResourceRequest::new("rg-a", "shared001", ResourceKind::StorageAccount);
    orchestrator.provision(&first, &ctx).await.unwrap();

    let second = ResourceRequest::new("rg-b", "shared001", ResourceKind::StorageAccount);
    match orchestrator.submit(&second).await {
        Err(SubmissionError::NameUnavailable { name, message }) => {
            assert_eq!(name, "shared001");
            assert!(message.contains("already taken"), "{message}");
        }
        other => panic!("expected NameUnavailable, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_deleting_missing_resource_fails_not_found() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;

    let id = ResourceId::new("sub-1", "rg-1", ResourceKind::VirtualNetwork, "ghost");
    let handle = orchestrator.delete(&id).await.unwrap();
    let outcome = orchestrator
        .await_completion(handle, &CancellableContext::new())
        .await
        .unwrap();

    match outcome {
        OperationOutcome::Failure(e) => assert_eq!(e.code, FailureCode::NotFound),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_deleting_vnet_removes_its_subnets() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;
    let ctx = CancellableContext::new();

    let network = orchestrator
        .provision(&vnet("rg-1", "vnet-a", "10.0.0.0/8"), &ctx)
        .await
        .unwrap();
    let subnet_request = ResourceRequest::new("rg-1", "subnet-1", ResourceKind::Subnet)
        .with_parent("vnet-a")
        .with_spec(json!({ "properties": { "addressPrefix": "10.0.0.0/16" } }));
    let subnet = orchestrator.provision(&subnet_request, &ctx).await.unwrap();
    assert_eq!(subnet.id.parent(), Some("vnet-a"));

    orchestrator.remove(&network.id, &ctx).await.unwrap();
    assert!(orchestrator.get(&subnet.id).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_spec_is_rejected_synchronously() {
    let (orchestrator, _) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;

    let request = ResourceRequest::new("rg-1", "vnet-empty", ResourceKind::VirtualNetwork);
    assert!(matches!(
        orchestrator.submit(&request).await,
        Err(SubmissionError::InvalidSpec(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_failures_are_retried_by_the_client() {
    let (_, client) = start(SimulationProfile::default());
    let orchestrator = ProvisioningOrchestrator::new(RetryingClient::new(
        client.clone(),
        RetryConfig::with_max_attempts(5),
    ));
    create_group(&orchestrator, "rg-1").await;

    client.inject_poll_failures(2).await.unwrap();
    let record = orchestrator
        .provision(&vnet("rg-1", "vnet-a", "10.0.0.0/8"), &CancellableContext::new())
        .await
        .unwrap();
    assert_eq!(record.name, "vnet-a");
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_failure_surfaces_without_retry() {
    let (orchestrator, client) = start(SimulationProfile::default());
    create_group(&orchestrator, "rg-1").await;

    let handle = orchestrator.submit(&vnet("rg-1", "vnet-a", "10.0.0.0/8")).await.unwrap();
    client.inject_poll_failures(1).await.unwrap();
    let result = orchestrator
        .await_completion(handle, &CancellableContext::new())
        .await;

    assert!(matches!(
        result,
        Err(WaitError::Polling(PollingError::Transient { .. }))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_provider_cancel_maps_to_canceled_failure() {
    let (orchestrator, client) = start(slow_profile());
    create_group(&orchestrator, "rg-1").await;

    let request = vnet("rg-1", "vnet-c", "10.0.0.0/8");
    let handle = orchestrator.submit(&request).await.unwrap();
    assert!(client.cancel_operation(handle.operation_id()).await.unwrap());

    let outcome = orchestrator
        .await_completion(handle, &CancellableContext::new())
        .await
        .unwrap();
    match outcome {
        OperationOutcome::Failure(e) => assert_eq!(e.code, FailureCode::Canceled),
        other => panic!("expected canceled failure, got {other:?}"),
    }
    assert!(orchestrator.get(&request.resource_id("sub-1")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_backwards_status_reports_are_ignored() {
    let mut mock = MockCloud::new();
    let request = vnet("rg-1", "vnet-a", "10.0.0.0/8");
    let id = request.resource_id("sub-1");
    let record = ResourceRecord {
        name: "vnet-a".into(),
        id: id.clone(),
        kind: ResourceKind::VirtualNetwork,
        location: "westeurope".into(),
        properties: json!({ "provisioningState": "Succeeded" }),
        tags: BTreeMap::new(),
    };

    mock.expect_create_or_update()
        .return_ok(OperationHandle::new("op-1", id, OperationKind::CreateOrUpdate));
    mock.expect_poll().return_status(OperationStatus::Running);
    mock.expect_poll().return_status(OperationStatus::Accepted);
    mock.expect_poll()
        .return_status(OperationStatus::Succeeded(Some(record.clone())));

    let orchestrator = ProvisioningOrchestrator::new(mock.client());
    let handle = orchestrator.submit(&request).await.unwrap();
    let (outcome, tracker) = orchestrator
        .await_with_history(handle, &CancellableContext::new())
        .await
        .unwrap();

    assert_eq!(outcome, OperationOutcome::Success(record));
    assert_eq!(
        tracker.history(),
        &[
            OperationState::Submitted,
            OperationState::Running,
            OperationState::Succeeded,
        ]
    );
    mock.verify();
}

#[tokio::test]
async fn test_success_without_record_is_fetched() {
    let mut mock = MockCloud::new();
    let request = ResourceRequest::new("rg-1", "nsg-1", ResourceKind::NetworkSecurityGroup);
    let id = request.resource_id("sub-1");
    let record = ResourceRecord {
        name: "nsg-1".into(),
        id: id.clone(),
        kind: ResourceKind::NetworkSecurityGroup,
        location: "westeurope".into(),
        properties: json!({ "provisioningState": "Succeeded" }),
        tags: BTreeMap::new(),
    };

    mock.expect_create_or_update()
        .return_ok(OperationHandle::new("op-1", id, OperationKind::CreateOrUpdate));
    mock.expect_poll().return_status(OperationStatus::Succeeded(None));
    mock.expect_get().return_ok(Some(record.clone()));

    let orchestrator = ProvisioningOrchestrator::new(mock.client());
    let outcome = orchestrator
        .provision(&request, &CancellableContext::new())
        .await
        .unwrap();
    assert_eq!(outcome, record);
    mock.verify();
}

#[tokio::test]
async fn test_success_with_vanished_resource_is_a_fetch_error() {
    let mut mock = MockCloud::new();
    let request = ResourceRequest::new("rg-1", "nsg-1", ResourceKind::NetworkSecurityGroup);
    let id = request.resource_id("sub-1");

    mock.expect_create_or_update().return_ok(OperationHandle::new(
        "op-1",
        id.clone(),
        OperationKind::CreateOrUpdate,
    ));
    mock.expect_poll().return_status(OperationStatus::Succeeded(None));
    mock.expect_get().return_ok(None);

    let orchestrator = ProvisioningOrchestrator::new(mock.client());
    let handle = orchestrator.submit(&request).await.unwrap();
    let err = orchestrator
        .await_completion(handle, &CancellableContext::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WaitError::Fetch(RequestError::NotFound(ref missing)) if *missing == id.to_string()
    ));
    mock.verify();
}

#[tokio::test]
async fn test_unreachable_control_plane() {
    let mut mock = MockCloud::new();
    mock.expect_create_or_update()
        .return_err(SubmissionError::Unreachable);

    let orchestrator = ProvisioningOrchestrator::new(mock.client());
    let request = ResourceRequest::new("rg-1", "nsg-1", ResourceKind::NetworkSecurityGroup);
    assert_eq!(
        orchestrator.submit(&request).await.unwrap_err(),
        SubmissionError::Unreachable
    );
    mock.verify();
}
