//! docdb-auth - Cluster authentication core for the docdb wire-protocol client
//!
//! This library establishes trusted identity with a cluster node before
//! normal command traffic flows:
//! - Drives multi-round SASL conversations (`saslStart`/`saslContinue`)
//!   with runtime-selected mechanism backends via the [`auth`] module
//! - Parses short-lived bearer tokens from the Azure metadata service and
//!   zeroizes them on drop ([`auth::azure`])
//! - Reads the externally-published cluster topology through pinned,
//!   immutable snapshots ([`topology`]) without ever blocking the
//!   monitoring path
//! - Dispatches authentication commands against the fixed `$external`
//!   database with session ids forbidden ([`command`])
//!
//! Byte I/O, TLS, HTTP, and topology monitoring are collaborator seams the
//! caller supplies; this crate owns only the conversation.

#[macro_use]
mod logging;

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod topology;

pub use auth::{
    authenticate, run_conversation, AccessToken, Credential, ImdsMetadataRequest, Mechanism,
    MechanismBackend, SaslConversation, SaslStep,
};
pub use command::{
    run_auth_command, CommandError, CommandParts, ServerStream, Transport, AUTH_DATABASE,
};
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use topology::{
    ServerAddress, ServerDescription, ServerType, SharedTopology, TopologySnapshot,
};
