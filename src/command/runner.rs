//! Running a single authentication command against one node.

use std::fmt;

use bson::{Bson, Document};

use crate::error::AuthError;
use crate::topology::{ServerAddress, SharedTopology};

use super::{CommandParts, ServerStream, Transport};

/// Failure of one authentication command.
///
/// The reply document is always present so callers can inspect
/// server-provided diagnostic fields (`errmsg`, `code`) in addition to the
/// structured error; on a transport failure it is simply empty.
#[derive(Debug)]
pub struct CommandError {
    /// The server's reply, or an empty document if the round trip failed
    pub reply: Document,
    /// The structured error describing the failure
    pub error: AuthError,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<CommandError> for AuthError {
    fn from(failure: CommandError) -> Self {
        failure.error
    }
}

/// Whether the server reported the command as successful.
///
/// The `ok` field is numeric on the wire; any of int32/int64/double `1`
/// counts as success.
fn reply_ok(reply: &Document) -> bool {
    match reply.get("ok") {
        Some(Bson::Int32(v)) => *v == 1,
        Some(Bson::Int64(v)) => *v == 1,
        Some(Bson::Double(v)) => *v == 1.0,
        _ => false,
    }
}

/// Run one authentication-phase command against the node at `address`.
///
/// Pins the current topology snapshot just long enough to resolve the
/// node's description, then releases it before the round trip so the
/// monitoring publish path is never blocked on network I/O. The command
/// always runs against the fixed auth database with session ids forbidden
/// (see [`CommandParts::auth_command`]).
///
/// On success the reply document is returned; on failure the returned
/// [`CommandError`] still carries the reply (empty for transport failures).
pub async fn run_auth_command<T: Transport + ?Sized>(
    topology: &SharedTopology,
    transport: &mut T,
    address: &ServerAddress,
    body: Document,
) -> std::result::Result<Document, CommandError> {
    let description = {
        let snapshot = topology.acquire();
        match snapshot.server(address) {
            Some(description) => description.clone(),
            None => {
                return Err(CommandError {
                    reply: Document::new(),
                    error: AuthError::Protocol(format!(
                        "node {address} is not present in the current topology snapshot"
                    )),
                })
            }
        }
        // snapshot released here, before any network I/O
    };

    let parts = CommandParts::auth_command(body);
    let mut stream = ServerStream::new(description, transport);
    let reply = match stream.dispatch(&parts).await {
        Ok(reply) => reply,
        Err(error) => {
            debug!("auth command to {} failed in transport: {}", address, error);
            return Err(CommandError {
                reply: Document::new(),
                error,
            });
        }
    };

    if reply_ok(&reply) {
        Ok(reply)
    } else {
        let errmsg = reply
            .get_str("errmsg")
            .unwrap_or("no errmsg in reply")
            .to_string();
        let code = reply.get_i32("code").unwrap_or(0);
        Err(CommandError {
            reply,
            error: AuthError::Protocol(format!(
                "server rejected auth command (code {code}): {errmsg}"
            )),
        })
    }
}
