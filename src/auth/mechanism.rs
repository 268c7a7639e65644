//! Mechanism names and backend selection.
//!
//! The original compile-time selection between backends is a runtime choice
//! here: [`Mechanism::backend`] resolves the configured mechanism to a boxed
//! [`MechanismBackend`] exactly once per authentication attempt, and a
//! mechanism whose backend is not compiled in yields a configuration error
//! instead of an unreachable code path.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::error::{AuthError, Result};
use crate::topology::ServerAddress;

use super::credential::Credential;

/// Named SASL mechanisms this crate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// RFC 4616 username/password, single round trip
    Plain,
    /// Kerberos via the system GSSAPI/SSPI library (`gssapi` feature)
    Gssapi,
    /// Bearer token obtained from a cloud metadata service
    OidcToken,
}

impl Mechanism {
    /// Mechanism name as it appears in the `mechanism` command field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::Plain => "PLAIN",
            Mechanism::Gssapi => "GSSAPI",
            Mechanism::OidcToken => "OIDC",
        }
    }

    /// Resolve the backend for this mechanism.
    ///
    /// Checked before any network round trip: a mechanism that is not
    /// compiled in, or a credential missing the fields the mechanism needs,
    /// fails fast with [`AuthError::Configuration`].
    pub fn backend(
        &self,
        credential: &Credential,
        address: &ServerAddress,
    ) -> Result<Box<dyn MechanismBackend>> {
        match self {
            Mechanism::Plain => {
                let username = credential.username().ok_or_else(|| {
                    AuthError::Configuration("PLAIN authentication requires a username".into())
                })?;
                let password = credential.password().ok_or_else(|| {
                    AuthError::Configuration("PLAIN authentication requires a password".into())
                })?;
                Ok(Box::new(super::plain::PlainBackend::new(username, password)))
            }
            Mechanism::OidcToken => {
                let token = credential.token().ok_or_else(|| {
                    AuthError::Configuration(
                        "OIDC authentication requires an access token".into(),
                    )
                })?;
                Ok(Box::new(super::oidc::TokenBackend::new(token.clone())))
            }
            #[cfg(feature = "gssapi")]
            Mechanism::Gssapi => Ok(Box::new(super::gssapi::GssapiBackend::new(
                credential, address,
            )?)),
            #[cfg(not(feature = "gssapi"))]
            Mechanism::Gssapi => {
                let _ = address;
                Err(AuthError::Configuration(
                    "the GSSAPI mechanism requires docdb-auth built with the `gssapi` feature"
                        .into(),
                ))
            }
        }
    }
}

impl FromStr for Mechanism {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PLAIN" => Ok(Mechanism::Plain),
            "GSSAPI" => Ok(Mechanism::Gssapi),
            "OIDC" => Ok(Mechanism::OidcToken),
            other => Err(AuthError::Configuration(format!(
                "unsupported mechanism {other:?}; supported mechanisms are PLAIN, GSSAPI, OIDC"
            ))),
        }
    }
}

/// One step of a mechanism's challenge/response exchange.
pub struct SaslStep {
    payload: Zeroizing<Vec<u8>>,
    is_final: bool,
}

impl SaslStep {
    /// A step whose payload still expects a server response.
    pub fn more(payload: Vec<u8>) -> Self {
        Self {
            payload: Zeroizing::new(payload),
            is_final: false,
        }
    }

    /// The mechanism's last payload; after it is sent the conversation is
    /// logically finished.
    pub fn done(payload: Vec<u8>) -> Self {
        Self {
            payload: Zeroizing::new(payload),
            is_final: true,
        }
    }

    /// The outgoing payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether this is the mechanism's final payload.
    pub fn is_final(&self) -> bool {
        self.is_final
    }
}

// Custom Debug that never prints the payload bytes; payloads can carry
// passwords and tokens.
impl fmt::Debug for SaslStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslStep")
            .field("payload_len", &self.payload.len())
            .field("is_final", &self.is_final)
            .finish()
    }
}

/// Produces the next outgoing payload of a SASL exchange.
///
/// A backend is instantiated once per authentication attempt and stepped
/// strictly sequentially: the first call receives an empty prior payload,
/// every later call receives the server's most recent challenge. Backends
/// must treat payloads as opaque bytes; embedded NUL bytes are legal.
pub trait MechanismBackend: Send {
    /// Mechanism name, for logging.
    fn name(&self) -> &'static str;

    /// Produce the next payload from the server's prior payload.
    fn step(&mut self, server_payload: &[u8]) -> Result<SaslStep>;
}
