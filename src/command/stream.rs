//! Server stream abstraction over a caller-supplied transport.
//!
//! The raw byte I/O (socket/TLS, wire framing, timeouts) lives behind the
//! [`Transport`] trait; this module only binds one resolved node description
//! to that transport for the duration of a single command dispatch.

use async_trait::async_trait;
use bson::Document;

use crate::error::Result;
use crate::topology::ServerDescription;

use super::CommandParts;

/// Command-dispatch seam implemented by the connection layer.
///
/// A transport sends one prepared command to the node it is connected to
/// and returns the server's reply document. Timeouts and cancellation are
/// the transport's own concern; a timed-out dispatch surfaces as an `Err`.
///
/// # Thread Safety
///
/// Implementations must be `Send` so an authentication attempt can run on
/// any worker thread.
#[async_trait]
pub trait Transport: Send {
    /// Send `parts` to the connected node and return its reply document.
    async fn round_trip(&mut self, parts: &CommandParts) -> Result<Document>;
}

/// A resolved, live binding of one node description to a transport.
///
/// Owned by the command runner for the duration of one dispatch and torn
/// down afterwards regardless of outcome; nothing about it is reused across
/// commands.
pub struct ServerStream<'a, T: Transport + ?Sized> {
    description: ServerDescription,
    transport: &'a mut T,
}

impl<'a, T: Transport + ?Sized> ServerStream<'a, T> {
    /// Bind `description` to the caller's transport.
    pub fn new(description: ServerDescription, transport: &'a mut T) -> Self {
        Self {
            description,
            transport,
        }
    }

    /// The node this stream is bound to.
    pub fn description(&self) -> &ServerDescription {
        &self.description
    }

    /// Dispatch one command and return the reply.
    pub async fn dispatch(&mut self, parts: &CommandParts) -> Result<Document> {
        trace!(
            "dispatching {} command to {}",
            parts.database,
            self.description.address
        );
        self.transport.round_trip(parts).await
    }
}
