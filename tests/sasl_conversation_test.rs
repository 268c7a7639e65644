//! Integration tests for the SASL conversation engine.
//!
//! These tests drive full conversations over a scripted mock transport and
//! assert the exact sequence of commands that reaches the wire.

use async_trait::async_trait;
use bson::{doc, spec::BinarySubtype, Binary, Document};

use docdb_auth::auth::{run_conversation, MechanismBackend, SaslStep};
use docdb_auth::{
    authenticate, AuthError, CommandParts, Credential, Mechanism, ServerAddress,
    ServerDescription, ServerType, SharedTopology, TopologySnapshot, Transport,
};

/// Transport that replays scripted replies and records every command built.
struct ScriptedTransport {
    replies: Vec<Result<Document, AuthError>>,
    sent: Vec<CommandParts>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Result<Document, AuthError>>) -> Self {
        Self {
            replies,
            sent: Vec::new(),
        }
    }

    fn command(&self, index: usize) -> &Document {
        &self.sent[index].body
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn round_trip(&mut self, parts: &CommandParts) -> Result<Document, AuthError> {
        self.sent.push(parts.clone());
        if self.replies.is_empty() {
            panic!("transport received more commands than the script expects");
        }
        self.replies.remove(0)
    }
}

/// Backend that produces `total_steps` payloads, the last marked final.
struct ScriptedBackend {
    total_steps: u32,
    calls: u32,
}

impl ScriptedBackend {
    fn new(total_steps: u32) -> Self {
        Self {
            total_steps,
            calls: 0,
        }
    }
}

impl MechanismBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "SCRIPTED"
    }

    fn step(&mut self, _server_payload: &[u8]) -> Result<SaslStep, AuthError> {
        self.calls += 1;
        let payload = format!("client-step-{}", self.calls).into_bytes();
        if self.calls >= self.total_steps {
            Ok(SaslStep::done(payload))
        } else {
            Ok(SaslStep::more(payload))
        }
    }
}

fn node() -> ServerAddress {
    ServerAddress::new("db0.example.com", 27017)
}

fn topology() -> SharedTopology {
    SharedTopology::new(
        TopologySnapshot::new(1).with_server(
            ServerDescription::new(node())
                .with_server_type(ServerType::Primary)
                .with_max_wire_version(17),
        ),
    )
}

fn challenge_reply(conversation_id: i32, payload: &[u8], done: bool) -> Document {
    doc! {
        "ok": 1_i32,
        "conversationId": conversation_id,
        "payload": Binary { subtype: BinarySubtype::Generic, bytes: payload.to_vec() },
        "done": done,
    }
}

#[tokio::test]
async fn backend_final_on_second_step_means_exactly_two_round_trips() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![
        Ok(challenge_reply(9, b"server-challenge", false)),
        Ok(challenge_reply(9, b"", true)),
    ]);
    let mut backend = ScriptedBackend::new(2);

    let conversation = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .expect("conversation should complete");

    assert!(conversation.is_complete());
    assert_eq!(conversation.rounds(), 2);
    assert_eq!(conversation.conversation_id(), 9);
    assert!(conversation.is_id_assigned());

    // Exactly one saslStart and one saslContinue, never a third round trip.
    assert_eq!(transport.sent.len(), 2);
    assert_eq!(transport.command(0).get_i32("saslStart").unwrap(), 1);
    assert_eq!(transport.command(0).get_str("mechanism").unwrap(), "SCRIPTED");
    assert_eq!(transport.command(1).get_i32("saslContinue").unwrap(), 1);
    assert_eq!(transport.command(1).get_i32("conversationId").unwrap(), 9);
}

#[tokio::test]
async fn missing_conversation_id_defaults_to_zero_with_flag_unset() {
    let topology = topology();
    // saslStart reply omits conversationId entirely.
    let mut transport = ScriptedTransport::new(vec![
        Ok(doc! {
            "ok": 1_i32,
            "payload": Binary { subtype: BinarySubtype::Generic, bytes: b"ch".to_vec() },
            "done": false,
        }),
        Ok(challenge_reply(0, b"", true)),
    ]);
    let mut backend = ScriptedBackend::new(2);

    let conversation = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .unwrap();

    // The continue carried the documented default id of 0, and the engine's
    // flag (not the bare value) records that the server never assigned one.
    assert_eq!(transport.command(1).get_i32("conversationId").unwrap(), 0);
    assert!(!conversation.is_id_assigned());
    assert_eq!(conversation.conversation_id(), 0);
}

#[tokio::test]
async fn assigned_id_of_zero_sets_the_flag() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![
        Ok(challenge_reply(0, b"ch", false)),
        Ok(challenge_reply(0, b"", true)),
    ]);
    let mut backend = ScriptedBackend::new(2);

    let conversation = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .unwrap();
    assert_eq!(conversation.conversation_id(), 0);
    assert!(conversation.is_id_assigned());
}

#[tokio::test]
async fn transport_failure_on_start_builds_no_continue() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![Err(AuthError::Transport(
        "connection reset by peer".into(),
    ))]);
    let mut backend = ScriptedBackend::new(2);

    let err = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));

    // Only the saslStart ever reached the transport.
    assert_eq!(transport.sent.len(), 1);
    assert!(transport.command(0).get("saslContinue").is_none());
}

#[tokio::test]
async fn server_rejection_surfaces_diagnostics_and_stops() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![Ok(doc! {
        "ok": 0_i32,
        "errmsg": "mechanism unavailable",
        "code": 334_i32,
    })]);
    let mut backend = ScriptedBackend::new(2);

    let err = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)));
    assert!(err.to_string().contains("mechanism unavailable"));
    assert_eq!(transport.sent.len(), 1);
}

#[tokio::test]
async fn premature_server_done_is_a_protocol_error() {
    let topology = topology();
    // Server claims done while the backend still expects another exchange.
    let mut transport = ScriptedTransport::new(vec![Ok(challenge_reply(3, b"", true))]);
    let mut backend = ScriptedBackend::new(3);

    let err = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)));
    assert_eq!(transport.sent.len(), 1);
}

#[tokio::test]
async fn explicit_done_false_after_final_payload_is_a_protocol_error() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![
        Ok(challenge_reply(3, b"ch", false)),
        Ok(challenge_reply(3, b"", false)),
    ]);
    let mut backend = ScriptedBackend::new(2);

    let err = run_conversation(&topology, &mut transport, &node(), &mut backend)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)));
}

#[cfg(not(feature = "gssapi"))]
#[tokio::test]
async fn compiled_out_mechanism_never_reaches_the_wire() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![]);
    let credential = Credential::gssapi("user@EXAMPLE.COM");

    let err = authenticate(&topology, &mut transport, &node(), &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Configuration(_)));
    assert!(err.to_string().contains("gssapi"));
    assert!(transport.sent.is_empty());
}

#[tokio::test]
async fn plain_authentication_end_to_end() {
    let topology = topology();
    let mut transport = ScriptedTransport::new(vec![Ok(doc! {
        "ok": 1_i32,
        "conversationId": 1_i32,
        "done": true,
    })]);
    let credential = Credential::plain("app_user", "pencil");
    assert_eq!(credential.mechanism(), Mechanism::Plain);

    authenticate(&topology, &mut transport, &node(), &credential)
        .await
        .expect("PLAIN authentication should succeed");

    assert_eq!(transport.sent.len(), 1);
    let start = transport.command(0);
    assert_eq!(start.get_str("mechanism").unwrap(), "PLAIN");
    match start.get("payload") {
        Some(bson::Bson::Binary(binary)) => assert_eq!(binary.bytes, b"\0app_user\0pencil"),
        other => panic!("payload encoded as {other:?}"),
    }
}

#[tokio::test]
async fn oidc_authentication_sends_jwt_document() {
    let topology = topology();
    let body = r#"{
        "access_token": "header.claims.sig",
        "resource": "https://vault.azure.net",
        "token_type": "Bearer",
        "expires_in": "3599"
    }"#;
    let token = docdb_auth::AccessToken::try_from_json(body.as_bytes()).unwrap();
    let credential = Credential::oidc(token);

    let mut transport = ScriptedTransport::new(vec![Ok(doc! {
        "ok": 1_i32,
        "conversationId": 1_i32,
        "done": true,
    })]);

    authenticate(&topology, &mut transport, &node(), &credential)
        .await
        .expect("OIDC authentication should succeed");

    let start = transport.command(0);
    assert_eq!(start.get_str("mechanism").unwrap(), "OIDC");
    let payload = match start.get("payload") {
        Some(bson::Bson::Binary(binary)) => binary.bytes.clone(),
        other => panic!("payload encoded as {other:?}"),
    };
    let decoded = Document::from_reader(payload.as_slice()).unwrap();
    assert_eq!(decoded.get_str("jwt").unwrap(), "header.claims.sig");
}

#[tokio::test]
async fn node_absent_from_snapshot_fails_without_dispatch() {
    let topology = SharedTopology::default();
    let mut transport = ScriptedTransport::new(vec![]);
    let credential = Credential::plain("app_user", "pencil");

    let err = authenticate(&topology, &mut transport, &node(), &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)));
    assert!(transport.sent.is_empty());
}
