//! Assembled parts of one outgoing command.

use bson::Document;

/// Database every authentication command runs against.
///
/// Auth commands never execute in the application's namespace.
pub const AUTH_DATABASE: &str = "$external";

/// The pieces of a command as they go onto the wire.
///
/// For authentication commands the database is pinned to [`AUTH_DATABASE`]
/// and `prohibit_session_id` is always set: sessions do not exist before
/// authentication, so attaching a session id to an auth command is a
/// protocol violation the transport layer must refuse.
#[derive(Debug, Clone)]
pub struct CommandParts {
    /// Target database for the command
    pub database: String,
    /// The command body document
    pub body: Document,
    /// When set, the transport must not attach a session id
    pub prohibit_session_id: bool,
}

impl CommandParts {
    /// Assemble the parts for one authentication-phase command.
    pub fn auth_command(body: Document) -> Self {
        Self {
            database: AUTH_DATABASE.to_string(),
            body,
            prohibit_session_id: true,
        }
    }
}
