//! # Resources
//!
//! The resource model shared by the orchestrator and its collaborators:
//!
//! - [`ResourceKind`]: which provider type a request or record refers to.
//! - [`ResourceId`]: the fully qualified, ARM-style address of a resource.
//! - [`ResourceRecord`]: the materialized resource, only ever produced after an
//!   operation reached `Succeeded`.
//!
//! Ids round-trip through their string form, so they can be logged, stored and
//! handed back to [`ProvisioningOrchestrator::delete`](crate::ProvisioningOrchestrator::delete)
//! without keeping the original request around.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Kinds of resources the control plane knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ResourceKind {
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    NetworkSecurityGroup,
    StorageAccount,
}

impl ResourceKind {
    /// The provider namespace and type, e.g. `Microsoft.Network/virtualNetworks`.
    pub fn provider_type(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "Microsoft.Resources/resourceGroups",
            ResourceKind::VirtualNetwork => "Microsoft.Network/virtualNetworks",
            ResourceKind::Subnet => "Microsoft.Network/virtualNetworks/subnets",
            ResourceKind::NetworkSecurityGroup => "Microsoft.Network/networkSecurityGroups",
            ResourceKind::StorageAccount => "Microsoft.Storage/storageAccounts",
        }
    }

    /// Whether resources of this kind live under a parent resource.
    pub fn requires_parent(&self) -> bool {
        matches!(self, ResourceKind::Subnet)
    }

    /// Whether names of this kind are unique across the whole provider, not
    /// just within a resource group.
    pub fn has_global_names(&self) -> bool {
        matches!(self, ResourceKind::StorageAccount)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_type())
    }
}

/// Fully qualified resource address.
///
/// ```
/// use provision_framework::{ResourceId, ResourceKind};
///
/// let id = ResourceId::new("sub-1", "rg-1", ResourceKind::VirtualNetwork, "vnet-a");
/// assert_eq!(
///     id.to_string(),
///     "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-a"
/// );
/// assert_eq!(id.to_string().parse::<ResourceId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ResourceId {
    subscription_id: String,
    resource_group: String,
    kind: ResourceKind,
    parent: Option<String>,
    name: String,
}

impl ResourceId {
    /// Id of a top-level resource inside a resource group.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        kind: ResourceKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            kind,
            parent: None,
            name: name.into(),
        }
    }

    /// Id of the resource group itself.
    pub fn resource_group(subscription_id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(subscription_id, name.clone(), ResourceKind::ResourceGroup, name)
    }

    /// Id of a child resource such as a subnet.
    pub fn child(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        kind: ResourceKind,
        parent: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::new(subscription_id, resource_group, kind, name)
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn group(&self) -> &str {
        &self.resource_group
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the parent resource, if any.
    pub fn parent_id(&self) -> Option<ResourceId> {
        let parent = self.parent.as_ref()?;
        let parent_kind = match self.kind() {
            ResourceKind::Subnet => ResourceKind::VirtualNetwork,
            _ => return None,
        };
        Some(ResourceId::new(
            self.subscription_id.clone(),
            self.resource_group.clone(),
            parent_kind,
            parent.clone(),
        ))
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        match (self.kind(), &self.parent) {
            (ResourceKind::ResourceGroup, _) => Ok(()),
            (ResourceKind::Subnet, Some(parent)) => write!(
                f,
                "/providers/Microsoft.Network/virtualNetworks/{}/subnets/{}",
                parent, self.name
            ),
            (kind, _) => write!(f, "/providers/{}/{}", kind.provider_type(), self.name),
        }
    }
}

/// Error returned when a string is not a recognizable resource id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource id '{0}'")]
pub struct ParseResourceIdError(String);

impl FromStr for ResourceId {
    type Err = ParseResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseResourceIdError(s.to_string());
        let segments: Vec<&str> = s.trim_start_matches('/').split('/').collect();
        if segments.len() < 4
            || !segments[0].eq_ignore_ascii_case("subscriptions")
            || !segments[2].eq_ignore_ascii_case("resourceGroups")
            || segments.iter().any(|seg| seg.is_empty())
        {
            return Err(invalid());
        }
        let (subscription, group) = (segments[1], segments[3]);

        match &segments[4..] {
            [] => Ok(ResourceId::resource_group(subscription, group)),
            [providers, namespace, kind, name] if providers.eq_ignore_ascii_case("providers") => {
                let provider_type = format!("{namespace}/{kind}");
                let kind = [
                    ResourceKind::VirtualNetwork,
                    ResourceKind::NetworkSecurityGroup,
                    ResourceKind::StorageAccount,
                ]
                .into_iter()
                .find(|k| k.provider_type().eq_ignore_ascii_case(&provider_type))
                .ok_or_else(invalid)?;
                Ok(ResourceId::new(subscription, group, kind, *name))
            }
            [providers, namespace, vnets, parent, subnets, name]
                if providers.eq_ignore_ascii_case("providers")
                    && namespace.eq_ignore_ascii_case("Microsoft.Network")
                    && vnets.eq_ignore_ascii_case("virtualNetworks")
                    && subnets.eq_ignore_ascii_case("subnets") =>
            {
                Ok(ResourceId::child(
                    subscription,
                    group,
                    ResourceKind::Subnet,
                    *parent,
                    *name,
                ))
            }
            _ => Err(invalid()),
        }
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ParseResourceIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A materialized resource as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub location: String,
    pub properties: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ResourceRecord {
    /// Looks up a nested property by a `/`-separated path, e.g.
    /// `"addressSpace/addressPrefixes"`.
    pub fn property(&self, path: &str) -> Option<&Value> {
        path.split('/')
            .try_fold(&self.properties, |value, key| value.get(key))
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        self.property("provisioningState").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subnet_id_round_trips() {
        let id = ResourceId::child("sub", "rg-1", ResourceKind::Subnet, "vnet-a", "default");
        let text = id.to_string();
        assert_eq!(
            text,
            "/subscriptions/sub/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-a/subnets/default"
        );
        let parsed: ResourceId = text.parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.parent_id().unwrap().name(), "vnet-a");
    }

    #[test]
    fn resource_group_id_has_no_provider_segment() {
        let id = ResourceId::resource_group("sub", "rg-1");
        assert_eq!(id.to_string(), "/subscriptions/sub/resourceGroups/rg-1");
        assert_eq!(id.kind(), ResourceKind::ResourceGroup);
        assert_eq!(id.to_string().parse::<ResourceId>().unwrap(), id);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm"
            .parse::<ResourceId>()
            .unwrap_err();
        assert!(err.to_string().contains("Microsoft.Compute"));
        assert!("/subscriptions/s".parse::<ResourceId>().is_err());
    }

    #[test]
    fn record_serializes_id_as_string() {
        let id = ResourceId::new("s", "rg", ResourceKind::StorageAccount, "acct1");
        let record = ResourceRecord {
            name: "acct1".into(),
            id: id.clone(),
            kind: ResourceKind::StorageAccount,
            location: "westeurope".into(),
            properties: json!({}),
            tags: BTreeMap::new(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], json!(id.to_string()));
        assert!(value.get("tags").is_none());

        let back: ResourceRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn record_property_lookup_follows_path() {
        let record = ResourceRecord {
            name: "vnet-a".into(),
            id: ResourceId::new("s", "rg", ResourceKind::VirtualNetwork, "vnet-a"),
            kind: ResourceKind::VirtualNetwork,
            location: "westeurope".into(),
            properties: json!({
                "provisioningState": "Succeeded",
                "addressSpace": { "addressPrefixes": ["10.0.0.0/8"] }
            }),
            tags: BTreeMap::new(),
        };
        assert_eq!(record.provisioning_state(), Some("Succeeded"));
        assert_eq!(
            record.property("addressSpace/addressPrefixes"),
            Some(&json!(["10.0.0.0/8"]))
        );
        assert!(record.property("addressSpace/missing").is_none());
    }
}
