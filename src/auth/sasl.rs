//! SASL conversation engine.
//!
//! Drives the multi-round `saslStart`/`saslContinue` exchange against one
//! node: `START -> CONTINUE* -> {DONE, FAILED}`. Rounds are strictly
//! sequential because every payload depends on the server's previous reply,
//! and nothing about a conversation survives the attempt. There is no
//! internal retry anywhere; a failed round trip fails the conversation and
//! retry policy belongs to the caller.

use bson::{doc, spec::BinarySubtype, Binary, Bson, Document};

use crate::command::{run_auth_command, Transport};
use crate::error::{AuthError, Result};
use crate::topology::{ServerAddress, SharedTopology};

use super::credential::Credential;
use super::mechanism::MechanismBackend;

/// Build the `saslStart` command document.
///
/// Field names and types are a wire-compatibility contract with the server
/// and must not change. The payload travels as a length-prefixed binary
/// field so embedded NUL bytes are preserved exactly.
pub fn build_sasl_start(mechanism: &str, payload: &[u8]) -> Document {
    doc! {
        "saslStart": 1_i32,
        "mechanism": mechanism,
        "payload": Binary { subtype: BinarySubtype::Generic, bytes: payload.to_vec() },
        "autoAuthorize": 1_i32,
    }
}

/// Build the `saslContinue` command document.
pub fn build_sasl_continue(conversation_id: i32, payload: &[u8]) -> Document {
    doc! {
        "saslContinue": 1_i32,
        "conversationId": conversation_id,
        "payload": Binary { subtype: BinarySubtype::Generic, bytes: payload.to_vec() },
    }
}

/// Extract the server-assigned conversation id from a reply.
///
/// Only an int32 field is honored; anything else is treated as absent.
pub fn conversation_id(reply: &Document) -> Option<i32> {
    match reply.get("conversationId") {
        Some(Bson::Int32(id)) => Some(*id),
        _ => None,
    }
}

/// The server's payload from a reply.
///
/// Servers normally echo binary, but a UTF-8 string payload (as some older
/// servers send) is accepted as its raw bytes.
fn server_payload(reply: &Document) -> Result<&[u8]> {
    match reply.get("payload") {
        Some(Bson::Binary(binary)) => Ok(&binary.bytes),
        Some(Bson::String(text)) => Ok(text.as_bytes()),
        Some(other) => Err(AuthError::Parse(format!(
            "reply payload has unexpected type {:?}",
            other.element_type()
        ))),
        None => Err(AuthError::Parse("reply is missing a payload field".into())),
    }
}

/// Whether the reply explicitly carries `done: false`.
fn server_not_done(reply: &Document) -> bool {
    matches!(reply.get("done"), Some(Bson::Boolean(false)))
}

/// Whether the reply carries `done: true`.
fn server_done(reply: &Document) -> bool {
    matches!(reply.get("done"), Some(Bson::Boolean(true)))
}

/// State of one SASL conversation against one node.
///
/// Lives for the duration of a single authentication attempt and is
/// discarded afterwards, success or failure. The conversation id defaults
/// to 0 until the server assigns one; because a legitimate id of 0 is
/// indistinguishable from the default by value alone, the explicit
/// [`is_id_assigned`](SaslConversation::is_id_assigned) flag is what any
/// id-dependent logic must consult.
#[derive(Debug)]
pub struct SaslConversation {
    mechanism: String,
    conversation_id: i32,
    id_assigned: bool,
    rounds: u32,
    complete: bool,
}

impl SaslConversation {
    /// Begin tracking a conversation for the named mechanism.
    pub fn new(mechanism: impl Into<String>) -> Self {
        Self {
            mechanism: mechanism.into(),
            conversation_id: 0,
            id_assigned: false,
            rounds: 0,
            complete: false,
        }
    }

    /// The mechanism this conversation negotiates.
    pub fn mechanism(&self) -> &str {
        &self.mechanism
    }

    /// The conversation id to send with `saslContinue`; 0 until assigned.
    pub fn conversation_id(&self) -> i32 {
        self.conversation_id
    }

    /// Whether the server actually assigned the id, as opposed to the
    /// documented default of 0.
    pub fn is_id_assigned(&self) -> bool {
        self.id_assigned
    }

    /// Number of round trips completed so far.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Whether the conversation reached DONE.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Record the reply to the `saslStart` round.
    fn record_start_reply(&mut self, reply: &Document) {
        self.rounds += 1;
        if let Some(id) = conversation_id(reply) {
            self.conversation_id = id;
            self.id_assigned = true;
        }
    }

    /// Record the reply to a `saslContinue` round.
    fn record_continue_reply(&mut self) {
        self.rounds += 1;
    }

    fn mark_complete(&mut self) {
        self.complete = true;
    }
}

/// Authenticate the node at `address` with the given credential.
///
/// The mechanism backend is resolved before any network traffic, so an
/// unsupported or compiled-out mechanism fails with a configuration error
/// without a single round trip.
pub async fn authenticate<T: Transport + ?Sized>(
    topology: &SharedTopology,
    transport: &mut T,
    address: &ServerAddress,
    credential: &Credential,
) -> Result<()> {
    let mechanism = credential.mechanism();
    let mut backend = mechanism.backend(credential, address).map_err(|e| {
        error!("cannot authenticate {}: {}", address, e);
        e
    })?;
    run_conversation(topology, transport, address, backend.as_mut())
        .await
        .map(|_| ())
}

/// Drive one full SASL conversation with an already-resolved backend.
///
/// Each round runs through [`run_auth_command`], which pins the topology
/// snapshot only long enough to resolve the node and never across network
/// I/O. Returns the completed conversation state so callers can inspect
/// the assigned conversation id and round count.
pub async fn run_conversation<T: Transport + ?Sized>(
    topology: &SharedTopology,
    transport: &mut T,
    address: &ServerAddress,
    backend: &mut dyn MechanismBackend,
) -> Result<SaslConversation> {
    let mut conversation = SaslConversation::new(backend.name());

    debug!("starting {} conversation with {}", backend.name(), address);
    let mut step = backend.step(&[])?;
    let command = build_sasl_start(backend.name(), step.payload());
    let mut reply = run_round(topology, transport, address, command).await?;
    conversation.record_start_reply(&reply);
    if !conversation.is_id_assigned() {
        warn!(
            "saslStart reply from {} carried no int32 conversationId; continuing with id 0",
            address
        );
    }

    loop {
        if step.is_final() {
            if server_not_done(&reply) {
                return Err(AuthError::Protocol(format!(
                    "{} reported the conversation unfinished after the {} mechanism's final payload",
                    address,
                    backend.name()
                )));
            }
            conversation.mark_complete();
            info!(
                "authenticated {} via {} in {} round trips",
                address,
                backend.name(),
                conversation.rounds()
            );
            return Ok(conversation);
        }
        if server_done(&reply) {
            return Err(AuthError::Protocol(format!(
                "{} ended the conversation before the {} mechanism completed",
                address,
                backend.name()
            )));
        }

        let challenge = server_payload(&reply)?;
        step = backend.step(challenge)?;
        let command = build_sasl_continue(conversation.conversation_id(), step.payload());
        reply = run_round(topology, transport, address, command).await?;
        conversation.record_continue_reply();
    }
}

/// Run one round, folding command failures into the conversation's error.
async fn run_round<T: Transport + ?Sized>(
    topology: &SharedTopology,
    transport: &mut T,
    address: &ServerAddress,
    command: Document,
) -> Result<Document> {
    match run_auth_command(topology, transport, address, command).await {
        Ok(reply) => Ok(reply),
        Err(failure) => {
            // The reply is populated even on failure; surface any server
            // diagnostics before reporting the structured error.
            if let Ok(errmsg) = failure.reply.get_str("errmsg") {
                debug!("server diagnostic from {}: {}", address, errmsg);
            }
            Err(failure.error)
        }
    }
}
