//! Credential material for one authentication attempt.
//!
//! All secret fields use [`Zeroizing`] storage so they are securely erased
//! when the credential is dropped, and the [`Debug`] implementation redacts
//! them.

use std::fmt;

use zeroize::Zeroizing;

use super::azure::AccessToken;
use super::mechanism::Mechanism;

/// Credentials for authenticating one node.
///
/// Which fields are required depends on the mechanism; the mismatch is
/// reported by [`Mechanism::backend`](super::Mechanism::backend) as a
/// configuration error before any network round trip.
///
/// # Example
///
/// ```
/// use docdb_auth::auth::Credential;
///
/// let credential = Credential::plain("app_user", "secret");
/// let debug = format!("{:?}", credential);
/// assert!(!debug.contains("secret"));
/// ```
#[derive(Clone)]
pub struct Credential {
    mechanism: Mechanism,
    username: Option<String>,
    password: Option<Zeroizing<String>>,
    token: Option<AccessToken>,
    service_name: Option<String>,
}

impl Credential {
    /// Credentials for the PLAIN mechanism.
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mechanism: Mechanism::Plain,
            username: Some(username.into()),
            password: Some(Zeroizing::new(password.into())),
            token: None,
            service_name: None,
        }
    }

    /// Credentials for the OIDC bearer-token mechanism.
    pub fn oidc(token: AccessToken) -> Self {
        Self {
            mechanism: Mechanism::OidcToken,
            username: None,
            password: None,
            token: Some(token),
            service_name: None,
        }
    }

    /// Credentials for the GSSAPI mechanism.
    ///
    /// The principal is taken from the ambient credential cache; only the
    /// username (for logging) and an optional service name are carried.
    pub fn gssapi(username: impl Into<String>) -> Self {
        Self {
            mechanism: Mechanism::Gssapi,
            username: Some(username.into()),
            password: None,
            token: None,
            service_name: None,
        }
    }

    /// Override the GSSAPI service name (builder pattern).
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// The configured mechanism.
    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// The username, if the mechanism uses one.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The password, if the mechanism uses one.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(|p| p.as_str())
    }

    /// The bearer token, if the mechanism uses one.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// The GSSAPI service name override, if any.
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }
}

// Custom Debug that redacts secret material.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field(
                "password",
                &self.password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token", &self.token)
            .field("service_name", &self.service_name)
            .finish()
    }
}
