//! # Credentials
//!
//! Resolves the bearer credential used by every control-plane client. Resolution is
//! explicit and synchronous: if no credential source is configured the caller gets an
//! [`AuthResolutionError`] at startup instead of a client that fails on first use.
//!
//! [`EnvironmentCredentialProvider`] tries, in order:
//!
//! 1. Client secret: `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`
//! 2. Managed identity: `IDENTITY_ENDPOINT` or `MSI_ENDPOINT`

use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const IDENTITY_ENDPOINT_VAR: &str = "IDENTITY_ENDPOINT";
pub const MSI_ENDPOINT_VAR: &str = "MSI_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthResolutionError {
    #[error("client secret credentials are incomplete: {0} is not set")]
    Incomplete(&'static str),
    #[error(
        "no credentials found: set AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET, \
         or run with a managed identity"
    )]
    NoCredentials,
}

/// Where a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    ClientSecret,
    ManagedIdentity,
}

/// An opaque bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    secret: String,
    source: CredentialSource,
}

impl AuthToken {
    pub fn new(secret: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            secret: secret.into(),
            source,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("secret", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Produces the credential for control-plane clients.
pub trait CredentialProvider: Send + Sync {
    fn resolve_authorizer(&self) -> Result<AuthToken, AuthResolutionError>;
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves credentials from environment variables.
pub struct EnvironmentCredentialProvider {
    lookup: Lookup,
}

impl EnvironmentCredentialProvider {
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }
}

impl CredentialProvider for EnvironmentCredentialProvider {
    fn resolve_authorizer(&self) -> Result<AuthToken, AuthResolutionError> {
        let tenant = self.var(TENANT_ID_VAR);
        let client = self.var(CLIENT_ID_VAR);
        let secret = self.var(CLIENT_SECRET_VAR);

        match (tenant, client, secret) {
            (Some(tenant), Some(client), Some(secret)) => {
                info!(%tenant, %client, "Using client secret credentials");
                return Ok(AuthToken::new(
                    format!("{tenant}/{client}/{secret}"),
                    CredentialSource::ClientSecret,
                ));
            }
            (None, None, None) => debug!("No client secret credentials configured"),
            (tenant, client, _) => {
                let missing = if tenant.is_none() {
                    TENANT_ID_VAR
                } else if client.is_none() {
                    CLIENT_ID_VAR
                } else {
                    CLIENT_SECRET_VAR
                };
                return Err(AuthResolutionError::Incomplete(missing));
            }
        }

        match self
            .var(IDENTITY_ENDPOINT_VAR)
            .or_else(|| self.var(MSI_ENDPOINT_VAR))
        {
            Some(endpoint) => {
                info!(%endpoint, "Using managed identity");
                Ok(AuthToken::new(
                    format!("msi:{endpoint}"),
                    CredentialSource::ManagedIdentity,
                ))
            }
            None => Err(AuthResolutionError::NoCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn provider(vars: &[(&str, &str)]) -> EnvironmentCredentialProvider {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvironmentCredentialProvider::with_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_client_secret_wins() {
        let token = provider(&[
            (TENANT_ID_VAR, "tenant"),
            (CLIENT_ID_VAR, "client"),
            (CLIENT_SECRET_VAR, "s3cret"),
            (MSI_ENDPOINT_VAR, "http://169.254.169.254"),
        ])
        .resolve_authorizer()
        .unwrap();

        assert_eq!(token.source(), CredentialSource::ClientSecret);
        assert!(!format!("{token:?}").contains("s3cret"));
    }

    #[test]
    fn test_managed_identity_fallback() {
        let token = provider(&[(IDENTITY_ENDPOINT_VAR, "http://localhost:42356/msi/token")])
            .resolve_authorizer()
            .unwrap();
        assert_eq!(token.source(), CredentialSource::ManagedIdentity);
    }

    #[test]
    fn test_partial_client_secret_is_an_error() {
        let err = provider(&[(TENANT_ID_VAR, "tenant"), (CLIENT_ID_VAR, "client")])
            .resolve_authorizer()
            .unwrap_err();
        assert_eq!(err, AuthResolutionError::Incomplete(CLIENT_SECRET_VAR));
    }

    #[test]
    fn test_nothing_configured() {
        assert_eq!(
            provider(&[]).resolve_authorizer().unwrap_err(),
            AuthResolutionError::NoCredentials
        );
    }
}
