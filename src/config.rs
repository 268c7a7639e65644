//! Authentication configuration.
//!
//! Deserialized from the client's YAML configuration; maps onto a
//! [`Credential`] once any runtime-only material (the OIDC access token)
//! is supplied.

use serde::Deserialize;

use crate::auth::{AccessToken, Credential, Mechanism};
use crate::error::{AuthError, Result};

/// The `auth` section of the client configuration.
///
/// # Example
///
/// ```yaml
/// mechanism: PLAIN
/// username: app_user
/// password: secret
/// ```
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Mechanism name: PLAIN, GSSAPI, or OIDC
    pub mechanism: String,

    /// Username (PLAIN, GSSAPI)
    #[serde(default)]
    pub username: Option<String>,

    /// Password (PLAIN)
    #[serde(default)]
    pub password: Option<String>,

    /// GSSAPI service name override
    #[serde(default)]
    pub service_name: Option<String>,

    /// Resource to request IMDS tokens for (OIDC)
    #[serde(default)]
    pub token_resource: Option<String>,
}

impl AuthConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// The configured mechanism.
    pub fn mechanism(&self) -> Result<Mechanism> {
        self.mechanism.parse()
    }

    /// Build the credential for one authentication attempt.
    ///
    /// `token` must be supplied for the OIDC mechanism (tokens are
    /// short-lived and fetched at runtime, never configured) and is ignored
    /// otherwise.
    pub fn credential(&self, token: Option<AccessToken>) -> Result<Credential> {
        let credential = match self.mechanism()? {
            Mechanism::Plain => {
                let username = self.username.clone().ok_or_else(|| {
                    AuthError::Configuration("PLAIN configuration requires a username".into())
                })?;
                let password = self.password.clone().ok_or_else(|| {
                    AuthError::Configuration("PLAIN configuration requires a password".into())
                })?;
                Credential::plain(username, password)
            }
            Mechanism::Gssapi => {
                let username = self.username.clone().ok_or_else(|| {
                    AuthError::Configuration("GSSAPI configuration requires a username".into())
                })?;
                let mut credential = Credential::gssapi(username);
                if let Some(service) = &self.service_name {
                    credential = credential.with_service_name(service.clone());
                }
                credential
            }
            Mechanism::OidcToken => {
                let token = token.ok_or_else(|| {
                    AuthError::Configuration(
                        "OIDC authentication requires a freshly fetched access token".into(),
                    )
                })?;
                Credential::oidc(token)
            }
        };
        Ok(credential)
    }
}
