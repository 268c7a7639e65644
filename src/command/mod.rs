//! Authentication-phase command dispatch.
//!
//! This module owns the narrow path between the SASL engine and the wire:
//! build [`CommandParts`] for the fixed auth database, resolve the target
//! node from the current topology snapshot, bind it to the caller's
//! [`Transport`] as a [`ServerStream`] for exactly one dispatch, and hand
//! back the server's reply document.

mod parts;
mod runner;
mod stream;

pub use parts::{CommandParts, AUTH_DATABASE};
pub use runner::{run_auth_command, CommandError};
pub use stream::{ServerStream, Transport};
