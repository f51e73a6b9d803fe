//! # Simulated Control Plane
//!
//! An in-process control plane built as an actor: [`SimulatedCloud`] owns every resource
//! and in-flight operation and processes [`CloudRequest`] messages sequentially, so its
//! state needs no locks. [`SimulatedCloudClient`] is the cheap, cloneable sender half
//! and implements [`CloudResourceClient`].
//!
//! ## Behavior
//!
//! - Operations progress with (tokio) time: `Accepted` until `accept_delay`, `Running`
//!   until `completion_delay`, then terminal.
//! - Effects are applied exactly once, when an operation settles. Settling happens before
//!   every message, so remote work completes even if nobody is waiting for it.
//! - Resources must be created inside an existing resource group. Deleting a group
//!   removes everything in it; deleting a virtual network removes its subnets.
//! - Storage account names are global and must be 3–24 lowercase letters or digits.
//! - Deleting something that does not exist fails asynchronously with `NotFound`.
//! - A terminal status is handed out once; the operation is forgotten after that poll.
//!   Settled operations nobody polls are kept up to a fixed retention.
//!
//! ## Usage
//!
//! ```rust
//! use provision_framework::simulator::{SimulatedCloud, SimulationProfile};
//! use provision_framework::{CancellableContext, ProvisioningOrchestrator, ResourceKind, ResourceRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (cloud, client) = SimulatedCloud::new("sub-1", SimulationProfile::instant());
//!     tokio::spawn(cloud.run());
//!
//!     let orchestrator = ProvisioningOrchestrator::new(client.authorized("token"));
//!     let ctx = CancellableContext::new();
//!     let group = ResourceRequest::new("rg-1", "rg-1", ResourceKind::ResourceGroup);
//!     let record = orchestrator.provision(&group, &ctx).await.unwrap();
//!     assert_eq!(record.name, "rg-1");
//! }
//! ```

use crate::cloud_client::{CloudResourceClient, NameAvailability};
use crate::error::{PollingError, ProvisioningError, RequestError, SubmissionError};
use crate::request::{OperationHandle, OperationKind, OperationStatus, ResourceRequest};
use crate::resource::{ResourceId, ResourceKind, ResourceRecord};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How many settled operations stay pollable when nobody observes their outcome.
const SETTLED_RETENTION: usize = 256;

/// Timing and defaults of the simulated control plane.
#[derive(Debug, Clone)]
pub struct SimulationProfile {
    /// How long a new operation reports `Accepted`.
    pub accept_delay: Duration,
    /// How long until an operation settles into a terminal state.
    pub completion_delay: Duration,
    /// Interval advertised to pollers.
    pub poll_interval: Duration,
    /// Location used when a request does not name one.
    pub default_location: String,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            accept_delay: Duration::from_millis(50),
            completion_delay: Duration::from_millis(200),
            poll_interval: Duration::from_millis(50),
            default_location: "westeurope".to_string(),
        }
    }
}

impl SimulationProfile {
    /// Operations settle on the first poll.
    pub fn instant() -> Self {
        Self {
            accept_delay: Duration::ZERO,
            completion_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            ..Self::default()
        }
    }
}

/// One-shot reply channel used by every [`CloudRequest`].
pub type Reply<T, E> = oneshot::Sender<Result<T, E>>;

/// Messages understood by [`SimulatedCloud`].
#[derive(Debug)]
pub enum CloudRequest {
    CheckName {
        kind: ResourceKind,
        resource_group: String,
        name: String,
        respond_to: Reply<NameAvailability, SubmissionError>,
    },
    CreateOrUpdate {
        request: ResourceRequest,
        respond_to: Reply<OperationHandle, SubmissionError>,
    },
    Delete {
        id: ResourceId,
        respond_to: Reply<OperationHandle, SubmissionError>,
    },
    Get {
        id: ResourceId,
        respond_to: Reply<Option<ResourceRecord>, RequestError>,
    },
    Poll {
        operation_id: String,
        respond_to: Reply<OperationStatus, PollingError>,
    },
    Invoke {
        id: ResourceId,
        action: String,
        respond_to: Reply<Value, RequestError>,
    },
    /// Makes the next operation on `resource_name` fail with `message`.
    InjectFailure {
        resource_name: String,
        message: String,
        respond_to: Reply<(), SubmissionError>,
    },
    /// Makes the next `count` polls fail transiently.
    InjectPollFailures {
        count: u32,
        respond_to: Reply<(), SubmissionError>,
    },
    /// Cancels an operation on the provider side.
    CancelOperation {
        operation_id: String,
        respond_to: Reply<bool, PollingError>,
    },
}

#[derive(Debug)]
enum Effect {
    Upsert {
        record: ResourceRecord,
        children: Option<Vec<ResourceRecord>>,
    },
    Remove,
}

#[derive(Debug)]
struct Operation {
    resource_id: ResourceId,
    submitted_at: Instant,
    effect: Effect,
    injected_failure: Option<String>,
    status: Option<OperationStatus>,
}

/// The actor half of the simulated control plane.
pub struct SimulatedCloud {
    receiver: mpsc::Receiver<CloudRequest>,
    subscription_id: String,
    profile: SimulationProfile,
    resources: BTreeMap<ResourceId, ResourceRecord>,
    storage_keys: HashMap<ResourceId, [String; 2]>,
    operations: HashMap<String, Operation>,
    pending: VecDeque<String>,
    settled: VecDeque<String>,
    injected_failures: HashMap<String, String>,
    poll_failures: u32,
    next_operation: u64,
}

impl SimulatedCloud {
    /// Creates the actor and an unauthenticated client for it.
    ///
    /// Call [`SimulatedCloudClient::authorized`] before submitting requests.
    pub fn new(
        subscription_id: impl Into<String>,
        profile: SimulationProfile,
    ) -> (Self, SimulatedCloudClient) {
        let (sender, receiver) = mpsc::channel(64);
        let client = SimulatedCloudClient::new(sender).with_poll_interval(profile.poll_interval);
        let cloud = Self {
            receiver,
            subscription_id: subscription_id.into(),
            profile,
            resources: BTreeMap::new(),
            storage_keys: HashMap::new(),
            operations: HashMap::new(),
            pending: VecDeque::new(),
            settled: VecDeque::new(),
            injected_failures: HashMap::new(),
            poll_failures: 0,
            next_operation: 1,
        };
        (cloud, client)
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self) {
        info!(subscription_id = %self.subscription_id, "Simulated cloud started");

        while let Some(msg) = self.receiver.recv().await {
            self.settle(Instant::now());
            match msg {
                CloudRequest::CheckName {
                    kind,
                    resource_group,
                    name,
                    respond_to,
                } => {
                    let availability = self.check_name(kind, &resource_group, &name);
                    debug!(%kind, %name, available = availability.available, "CheckName");
                    let _ = respond_to.send(Ok(availability));
                }
                CloudRequest::CreateOrUpdate {
                    request,
                    respond_to,
                } => {
                    debug!(?request, "CreateOrUpdate");
                    let result = self.begin_upsert(request);
                    if let Err(e) = &result {
                        warn!(error = %e, "CreateOrUpdate rejected");
                    }
                    let _ = respond_to.send(result);
                }
                CloudRequest::Delete { id, respond_to } => {
                    debug!(%id, "Delete");
                    let handle = self.start_operation(id, OperationKind::Delete, Effect::Remove);
                    let _ = respond_to.send(Ok(handle));
                }
                CloudRequest::Get { id, respond_to } => {
                    let record = self.resources.get(&id).cloned();
                    debug!(%id, found = record.is_some(), "Get");
                    let _ = respond_to.send(Ok(record));
                }
                CloudRequest::Poll {
                    operation_id,
                    respond_to,
                } => {
                    let status = self.poll(&operation_id);
                    debug!(%operation_id, ?status, "Poll");
                    let _ = respond_to.send(status);
                }
                CloudRequest::Invoke {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(%id, %action, "Invoke");
                    let _ = respond_to.send(self.invoke(&id, &action));
                }
                CloudRequest::InjectFailure {
                    resource_name,
                    message,
                    respond_to,
                } => {
                    self.injected_failures.insert(resource_name, message);
                    let _ = respond_to.send(Ok(()));
                }
                CloudRequest::InjectPollFailures { count, respond_to } => {
                    self.poll_failures = count;
                    let _ = respond_to.send(Ok(()));
                }
                CloudRequest::CancelOperation {
                    operation_id,
                    respond_to,
                } => {
                    let result = self.cancel(&operation_id);
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(
            resources = self.resources.len(),
            operations = self.operations.len(),
            "Shutdown"
        );
    }

    fn group_id(&self, group: &str) -> ResourceId {
        ResourceId::resource_group(self.subscription_id.clone(), group)
    }

    fn check_name(&self, kind: ResourceKind, resource_group: &str, name: &str) -> NameAvailability {
        if !kind.has_global_names() {
            return NameAvailability::available();
        }
        let valid = (3..=24).contains(&name.len())
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !valid {
            return NameAvailability::unavailable(
                "AccountNameInvalid",
                format!(
                    "{name} is not a valid storage account name. Storage account name must be \
                     between 3 and 24 characters in length and use numbers and lower-case letters only."
                ),
            );
        }

        let held_elsewhere = |id: &ResourceId| {
            id.kind() == kind && id.name() == name && id.group() != resource_group
        };
        let taken = self.resources.keys().any(held_elsewhere)
            || self.pending.iter().any(|op_id| {
                self.operations.get(op_id).is_some_and(|op| {
                    op.status.is_none()
                        && matches!(op.effect, Effect::Upsert { .. })
                        && held_elsewhere(&op.resource_id)
                })
            });
        if taken {
            NameAvailability::unavailable(
                "AlreadyExists",
                format!("The storage account named {name} is already taken."),
            )
        } else {
            NameAvailability::available()
        }
    }

    fn begin_upsert(&mut self, request: ResourceRequest) -> Result<OperationHandle, SubmissionError> {
        if request.kind != ResourceKind::ResourceGroup
            && !self.resources.contains_key(&self.group_id(&request.resource_group))
        {
            return Err(SubmissionError::Rejected(format!(
                "Resource group '{}' could not be found.",
                request.resource_group
            )));
        }

        let availability =
            self.check_name(request.kind, &request.resource_group, &request.resource_name);
        if !availability.available {
            return Err(SubmissionError::NameUnavailable {
                name: request.resource_name.clone(),
                message: availability.message.unwrap_or_default(),
            });
        }

        let properties = request
            .desired_spec
            .get("properties")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        self.validate(&request, &properties)?;

        let id = request.resource_id(&self.subscription_id);
        let location = request
            .location
            .clone()
            .or_else(|| {
                request
                    .desired_spec
                    .get("location")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.profile.default_location.clone());

        let children = match request.kind {
            ResourceKind::VirtualNetwork => properties.get("subnets").map(|subnets| {
                subnet_records(&id, &location, subnets)
            }),
            _ => None,
        };

        let record = ResourceRecord {
            name: request.resource_name.clone(),
            id: id.clone(),
            kind: request.kind,
            location,
            properties: with_state(properties, "Succeeded"),
            tags: request.tags.clone(),
        };

        let handle = self.start_operation(
            id,
            OperationKind::CreateOrUpdate,
            Effect::Upsert { record, children },
        );
        Ok(handle)
    }

    fn validate(&self, request: &ResourceRequest, properties: &Value) -> Result<(), SubmissionError> {
        if request.kind.requires_parent() {
            let id = request.resource_id(&self.subscription_id);
            let parent = id.parent_id().ok_or_else(|| {
                SubmissionError::InvalidSpec(format!("{} requires a parent resource", request.kind))
            })?;
            if !self.resources.contains_key(&parent) {
                return Err(SubmissionError::Rejected(format!(
                    "Parent resource '{}' not found.",
                    parent.name()
                )));
            }
        }
        match request.kind {
            ResourceKind::VirtualNetwork => {
                let prefixes = properties
                    .pointer("/addressSpace/addressPrefixes")
                    .and_then(Value::as_array);
                if prefixes.map_or(true, |p| p.is_empty()) {
                    return Err(SubmissionError::InvalidSpec(
                        "virtual network requires properties.addressSpace.addressPrefixes"
                            .to_string(),
                    ));
                }
            }
            ResourceKind::Subnet => {
                if properties.get("addressPrefix").and_then(Value::as_str).is_none() {
                    return Err(SubmissionError::InvalidSpec(
                        "subnet requires properties.addressPrefix".to_string(),
                    ));
                }
                if let Some(nsg) = properties.pointer("/networkSecurityGroup/id") {
                    let nsg_id = nsg
                        .as_str()
                        .and_then(|s| s.parse::<ResourceId>().ok())
                        .ok_or_else(|| {
                            SubmissionError::InvalidSpec(format!("invalid network security group id {nsg}"))
                        })?;
                    if !self.resources.contains_key(&nsg_id) {
                        return Err(SubmissionError::Rejected(format!(
                            "Network security group '{}' not found.",
                            nsg_id.name()
                        )));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start_operation(
        &mut self,
        resource_id: ResourceId,
        kind: OperationKind,
        effect: Effect,
    ) -> OperationHandle {
        let operation_id = format!("op-{}", self.next_operation);
        self.next_operation += 1;

        let injected_failure = self.injected_failures.remove(resource_id.name());
        let operation = Operation {
            resource_id: resource_id.clone(),
            submitted_at: Instant::now(),
            effect,
            injected_failure,
            status: None,
        };
        self.operations.insert(operation_id.clone(), operation);
        self.pending.push_back(operation_id.clone());
        info!(%operation_id, %resource_id, op = %kind, "Operation accepted");
        OperationHandle::new(operation_id, resource_id, kind)
    }

    /// Applies every operation that is due, in submission order.
    fn settle(&mut self, now: Instant) {
        while let Some(op_id) = self.pending.front() {
            let due = match self.operations.get(op_id) {
                Some(op) if op.status.is_some() => true,
                Some(op) => now.duration_since(op.submitted_at) >= self.profile.completion_delay,
                None => true,
            };
            if !due {
                break;
            }
            let Some(op_id) = self.pending.pop_front() else {
                break;
            };
            if let Some(mut op) = self.operations.remove(&op_id) {
                if op.status.is_none() {
                    let status = self.apply(&op);
                    info!(operation_id = %op_id, resource_id = %op.resource_id, state = ?status.state(), "Operation settled");
                    op.status = Some(status);
                }
                self.operations.insert(op_id.clone(), op);
                self.retain_settled(op_id);
            }
        }
    }

    fn retain_settled(&mut self, op_id: String) {
        self.settled.push_back(op_id);
        while self.settled.len() > SETTLED_RETENTION {
            if let Some(expired) = self.settled.pop_front() {
                if self.operations.remove(&expired).is_some() {
                    debug!(operation_id = %expired, "Settled operation expired unobserved");
                }
            }
        }
    }

    fn apply(&mut self, op: &Operation) -> OperationStatus {
        if let Some(message) = &op.injected_failure {
            return OperationStatus::Failed(ProvisioningError::internal(message.clone()));
        }
        let id = &op.resource_id;
        match &op.effect {
            Effect::Upsert { record, children } => {
                if id.kind() != ResourceKind::ResourceGroup
                    && !self.resources.contains_key(&self.group_id(id.group()))
                {
                    return OperationStatus::Failed(ProvisioningError::not_found(format!(
                        "Resource group '{}' could not be found.",
                        id.group()
                    )));
                }
                if let Some(parent) = id.parent_id() {
                    if !self.resources.contains_key(&parent) {
                        return OperationStatus::Failed(ProvisioningError::not_found(format!(
                            "Parent resource '{}' not found.",
                            parent.name()
                        )));
                    }
                }
                if let Some(children) = children {
                    self.resources.retain(|child, _| child.parent_id().as_ref() != Some(id));
                    for child in children {
                        self.resources.insert(child.id.clone(), child.clone());
                    }
                }
                if id.kind() == ResourceKind::StorageAccount && !self.storage_keys.contains_key(id) {
                    self.storage_keys
                        .insert(id.clone(), [generate_key(), generate_key()]);
                }
                self.resources.insert(id.clone(), record.clone());
                OperationStatus::Succeeded(Some(record.clone()))
            }
            Effect::Remove => {
                if self.resources.remove(id).is_none() {
                    return OperationStatus::Failed(ProvisioningError::not_found(format!(
                        "The resource '{}' under resource group '{}' was not found.",
                        id.name(),
                        id.group()
                    )));
                }
                self.storage_keys.remove(id);
                match id.kind() {
                    ResourceKind::ResourceGroup => {
                        self.resources.retain(|other, _| other.group() != id.group());
                        self.storage_keys.retain(|other, _| other.group() != id.group());
                    }
                    _ => self
                        .resources
                        .retain(|child, _| child.parent_id().as_ref() != Some(id)),
                }
                OperationStatus::Succeeded(None)
            }
        }
    }

    fn poll(&mut self, operation_id: &str) -> Result<OperationStatus, PollingError> {
        if self.poll_failures > 0 {
            self.poll_failures -= 1;
            return Err(PollingError::Transient {
                operation_id: operation_id.to_string(),
                message: "the service is temporarily unavailable".to_string(),
            });
        }
        let op = self
            .operations
            .get(operation_id)
            .ok_or_else(|| PollingError::UnknownOperation(operation_id.to_string()))?;
        if op.status.is_some() {
            return match self.operations.remove(operation_id).and_then(|op| op.status) {
                Some(status) => Ok(status),
                None => Err(PollingError::UnknownOperation(operation_id.to_string())),
            };
        }
        if op.submitted_at.elapsed() < self.profile.accept_delay {
            Ok(OperationStatus::Accepted)
        } else {
            Ok(OperationStatus::Running)
        }
    }

    fn cancel(&mut self, operation_id: &str) -> Result<bool, PollingError> {
        let op = self
            .operations
            .get_mut(operation_id)
            .ok_or_else(|| PollingError::UnknownOperation(operation_id.to_string()))?;
        if op.status.is_some() {
            return Ok(false);
        }
        op.status = Some(OperationStatus::Canceled);
        info!(%operation_id, "Operation canceled by provider");
        Ok(true)
    }

    fn invoke(&self, id: &ResourceId, action: &str) -> Result<Value, RequestError> {
        if !self.resources.contains_key(id) {
            return Err(RequestError::NotFound(id.to_string()));
        }
        match (id.kind(), action) {
            (ResourceKind::StorageAccount, "listKeys") => {
                let keys = self
                    .storage_keys
                    .get(id)
                    .ok_or_else(|| RequestError::NotFound(id.to_string()))?;
                Ok(json!({
                    "keys": [
                        { "keyName": "key1", "value": keys[0], "permissions": "FULL" },
                        { "keyName": "key2", "value": keys[1], "permissions": "FULL" },
                    ]
                }))
            }
            _ => Err(RequestError::UnsupportedAction {
                resource: id.to_string(),
                action: action.to_string(),
            }),
        }
    }
}

fn with_state(properties: Value, state: &str) -> Value {
    let mut map = match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("provisioningState".to_string(), Value::String(state.to_string()));
    Value::Object(map)
}

fn subnet_records(vnet: &ResourceId, location: &str, subnets: &Value) -> Vec<ResourceRecord> {
    subnets
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|subnet| {
            let name = subnet.get("name")?.as_str()?;
            let properties = subnet
                .get("properties")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            let id = ResourceId::child(
                vnet.subscription_id(),
                vnet.group(),
                ResourceKind::Subnet,
                vnet.name(),
                name,
            );
            Some(ResourceRecord {
                name: name.to_string(),
                id,
                kind: ResourceKind::Subnet,
                location: location.to_string(),
                properties: with_state(properties, "Succeeded"),
                tags: BTreeMap::new(),
            })
        })
        .collect()
}

fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Sender half of [`SimulatedCloud`].
///
/// Cheap to clone. Requests other than polls are refused with `Unauthorized` until a
/// bearer token is attached with [`authorized`](Self::authorized).
#[derive(Clone, Debug)]
pub struct SimulatedCloudClient {
    sender: mpsc::Sender<CloudRequest>,
    bearer: Option<Arc<str>>,
    poll_interval: Duration,
}

impl SimulatedCloudClient {
    pub fn new(sender: mpsc::Sender<CloudRequest>) -> Self {
        Self {
            sender,
            bearer: None,
            poll_interval: crate::cloud_client::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Returns a copy of this client that authenticates with `token`.
    pub fn authorized(&self, token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        Self {
            bearer: (!token.is_empty()).then(|| Arc::from(token)),
            ..self.clone()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    async fn call<T, E>(
        &self,
        build: impl FnOnce(Reply<T, E>) -> CloudRequest,
        unreachable: E,
    ) -> Result<T, E> {
        let (respond_to, response) = oneshot::channel();
        if self.sender.send(build(respond_to)).await.is_err() {
            return Err(unreachable);
        }
        match response.await {
            Ok(result) => result,
            Err(_) => Err(unreachable),
        }
    }

    /// Makes the next operation on `resource_name` end in `Failed` with `message`.
    pub async fn inject_failure(
        &self,
        resource_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), SubmissionError> {
        let (resource_name, message) = (resource_name.into(), message.into());
        self.call(
            |respond_to| CloudRequest::InjectFailure {
                resource_name,
                message,
                respond_to,
            },
            SubmissionError::Unreachable,
        )
        .await
    }

    /// Makes the next `count` status polls fail transiently.
    pub async fn inject_poll_failures(&self, count: u32) -> Result<(), SubmissionError> {
        self.call(
            |respond_to| CloudRequest::InjectPollFailures { count, respond_to },
            SubmissionError::Unreachable,
        )
        .await
    }

    /// Cancels an in-flight operation on the provider side. `Ok(false)` if it had
    /// already finished.
    pub async fn cancel_operation(&self, operation_id: &str) -> Result<bool, PollingError> {
        let operation_id = operation_id.to_string();
        self.call(
            |respond_to| CloudRequest::CancelOperation {
                operation_id,
                respond_to,
            },
            PollingError::Unreachable,
        )
        .await
    }
}

#[async_trait]
impl CloudResourceClient for SimulatedCloudClient {
    async fn check_name_availability(
        &self,
        kind: ResourceKind,
        resource_group: &str,
        name: &str,
    ) -> Result<NameAvailability, SubmissionError> {
        if self.bearer().is_none() {
            return Err(SubmissionError::Unauthorized("no bearer token".to_string()));
        }
        let (resource_group, name) = (resource_group.to_string(), name.to_string());
        self.call(
            |respond_to| CloudRequest::CheckName {
                kind,
                resource_group,
                name,
                respond_to,
            },
            SubmissionError::Unreachable,
        )
        .await
    }

    async fn create_or_update(
        &self,
        request: &ResourceRequest,
    ) -> Result<OperationHandle, SubmissionError> {
        if self.bearer().is_none() {
            return Err(SubmissionError::Unauthorized("no bearer token".to_string()));
        }
        let request = request.clone();
        self.call(
            |respond_to| CloudRequest::CreateOrUpdate {
                request,
                respond_to,
            },
            SubmissionError::Unreachable,
        )
        .await
    }

    async fn delete(&self, id: &ResourceId) -> Result<OperationHandle, SubmissionError> {
        if self.bearer().is_none() {
            return Err(SubmissionError::Unauthorized("no bearer token".to_string()));
        }
        let id = id.clone();
        self.call(
            |respond_to| CloudRequest::Delete { id, respond_to },
            SubmissionError::Unreachable,
        )
        .await
    }

    async fn get(&self, id: &ResourceId) -> Result<Option<ResourceRecord>, RequestError> {
        if self.bearer().is_none() {
            return Err(RequestError::Unauthorized("no bearer token".to_string()));
        }
        let id = id.clone();
        self.call(
            |respond_to| CloudRequest::Get { id, respond_to },
            RequestError::Unreachable,
        )
        .await
    }

    async fn poll_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, PollingError> {
        let operation_id = handle.operation_id().to_string();
        self.call(
            |respond_to| CloudRequest::Poll {
                operation_id,
                respond_to,
            },
            PollingError::Unreachable,
        )
        .await
    }

    async fn invoke(&self, id: &ResourceId, action: &str) -> Result<Value, RequestError> {
        if self.bearer().is_none() {
            return Err(RequestError::Unauthorized("no bearer token".to_string()));
        }
        let (id, action) = (id.clone(), action.to_string());
        self.call(
            |respond_to| CloudRequest::Invoke {
                id,
                action,
                respond_to,
            },
            RequestError::Unreachable,
        )
        .await
    }

    fn poll_interval(&self, _handle: &OperationHandle) -> Duration {
        self.poll_interval
    }
}
