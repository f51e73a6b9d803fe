use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    pub supports_https_traffic_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccountSpec {
    pub location: String,
    pub sku: Sku,
    pub kind: String,
    pub properties: StorageAccountProperties,
}

impl StorageAccountSpec {
    /// Locally redundant general-purpose account that only accepts HTTPS.
    pub fn standard_lrs(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            sku: Sku {
                name: "Standard_LRS".to_string(),
            },
            kind: "Storage".to_string(),
            properties: StorageAccountProperties {
                supports_https_traffic_only: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub key_name: String,
    pub value: String,
    pub permissions: String,
}

/// Result of the `listKeys` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeys {
    #[serde(default)]
    pub keys: Vec<AccountKey>,
}

impl AccountKeys {
    /// The first key, as listed by the provider.
    pub fn primary(&self) -> Option<&AccountKey> {
        self.keys.first()
    }
}
