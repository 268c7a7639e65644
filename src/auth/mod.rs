//! Node authentication.
//!
//! The pieces fit together as follows: a [`Credential`] names a
//! [`Mechanism`], which resolves to a [`MechanismBackend`] once per attempt;
//! [`authenticate`] then drives the SASL conversation over the caller's
//! transport, one `saslStart` and as many `saslContinue` rounds as the
//! backend needs. The [`azure`] module supplies bearer tokens for the
//! token-based backend.
//!
//! # Security
//!
//! Passwords, tokens, and outgoing payloads live in [`zeroize::Zeroizing`]
//! storage so secret material is erased when dropped, and `Debug`
//! implementations redact it.

pub mod azure;
mod credential;
#[cfg(feature = "gssapi")]
mod gssapi;
mod mechanism;
mod oidc;
mod plain;
pub mod sasl;

pub use azure::{AccessToken, ImdsMetadataRequest};
pub use credential::Credential;
pub use mechanism::{Mechanism, MechanismBackend, SaslStep};
pub use sasl::{authenticate, run_conversation, SaslConversation};
