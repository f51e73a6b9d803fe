use serde::{Deserialize, Serialize};

pub const DEFAULT_VNET_PREFIX: &str = "10.0.0.0/8";
pub const FIRST_SUBNET_PREFIX: &str = "10.0.0.0/16";
pub const SECOND_SUBNET_PREFIX: &str = "10.1.0.0/16";

/// Reference to another resource by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    pub address_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub properties: SubnetProperties,
}

impl SubnetSpec {
    pub fn new(address_prefix: impl Into<String>) -> Self {
        Self {
            name: None,
            properties: SubnetProperties {
                address_prefix: address_prefix.into(),
                network_security_group: None,
            },
        }
    }

    /// Names the subnet, for inline use inside a [`VirtualNetworkSpec`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_network_security_group(mut self, id: impl Into<String>) -> Self {
        self.properties.network_security_group = Some(SubResource { id: id.into() });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    pub address_space: AddressSpace,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetworkSpec {
    pub location: String,
    pub properties: VirtualNetworkProperties,
}

impl VirtualNetworkSpec {
    pub fn new(location: impl Into<String>, address_prefixes: Vec<String>) -> Self {
        Self {
            location: location.into(),
            properties: VirtualNetworkProperties {
                address_space: AddressSpace { address_prefixes },
                subnets: Vec::new(),
            },
        }
    }

    pub fn with_subnet(mut self, subnet: SubnetSpec) -> Self {
        self.properties.subnets.push(subnet);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSecurityGroupProperties {
    pub security_rules: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSecurityGroupSpec {
    pub location: String,
    pub properties: NetworkSecurityGroupProperties,
}
