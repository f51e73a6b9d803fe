//! # Configuration
//!
//! Settings are read from the environment once at startup into an [`AzureConfig`] that
//! is passed by reference from then on. A missing required variable is a startup error
//! returned to `main`, surfaced before any request is built.
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `AZURE_SUBSCRIPTION_ID` | yes | Subscription every resource id is scoped to |
//! | `AZURE_LOCATION` | yes | Region for new resources |
//! | `AZURE_RESOURCE_GROUP` | no | Overrides the generated `{prefix}-rg` group |

use rand::distributions::Uniform;
use rand::Rng;
use thiserror::Error;

pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";
pub const LOCATION_VAR: &str = "AZURE_LOCATION";
pub const RESOURCE_GROUP_VAR: &str = "AZURE_RESOURCE_GROUP";

const PREFIX_SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable \"{0}\" is not defined")]
    Missing(&'static str),
}

/// Immutable runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub subscription_id: String,
    pub location: String,
    pub resource_group: String,
    /// `test` plus six random lowercase letters; unique per run.
    pub test_prefix: String,
}

impl AzureConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let subscription_id = required(SUBSCRIPTION_ID_VAR)?;
        let location = required(LOCATION_VAR)?;

        let test_prefix = generate_test_prefix();
        let resource_group = lookup(RESOURCE_GROUP_VAR)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("{test_prefix}-rg"));

        Ok(Self {
            subscription_id,
            location,
            resource_group,
            test_prefix,
        })
    }

    /// Derives a resource name unique to this run, e.g. `testabcdefvnet`.
    pub fn name(&self, suffix: &str) -> String {
        format!("{}{}", self.test_prefix, suffix)
    }
}

fn generate_test_prefix() -> String {
    let letters = Uniform::new_inclusive(b'a', b'z');
    let suffix: String = rand::thread_rng()
        .sample_iter(letters)
        .take(PREFIX_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("test{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_loads_required_values() {
        let config = AzureConfig::from_lookup(lookup(&[
            (SUBSCRIPTION_ID_VAR, "sub-1"),
            (LOCATION_VAR, "westeurope"),
        ]))
        .unwrap();

        assert_eq!(config.subscription_id, "sub-1");
        assert_eq!(config.location, "westeurope");
        assert_eq!(config.resource_group, format!("{}-rg", config.test_prefix));
    }

    #[test]
    fn test_prefix_is_test_plus_six_lowercase_letters() {
        let prefix = generate_test_prefix();
        assert_eq!(prefix.len(), 10);
        assert!(prefix.starts_with("test"));
        assert!(prefix[4..].chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_missing_location_is_reported() {
        let err = AzureConfig::from_lookup(lookup(&[(SUBSCRIPTION_ID_VAR, "sub-1")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(LOCATION_VAR));
        assert_eq!(
            err.to_string(),
            "environment variable \"AZURE_LOCATION\" is not defined"
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = AzureConfig::from_lookup(lookup(&[
            (SUBSCRIPTION_ID_VAR, ""),
            (LOCATION_VAR, "westeurope"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(SUBSCRIPTION_ID_VAR));
    }

    #[test]
    fn test_resource_group_override() {
        let config = AzureConfig::from_lookup(lookup(&[
            (SUBSCRIPTION_ID_VAR, "sub-1"),
            (LOCATION_VAR, "westeurope"),
            (RESOURCE_GROUP_VAR, "shared-rg"),
        ]))
        .unwrap();
        assert_eq!(config.resource_group, "shared-rg");
        assert_eq!(config.name("vnet"), format!("{}vnet", config.test_prefix));
    }
}
