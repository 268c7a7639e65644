//! Bearer-token backend.
//!
//! Wraps an [`AccessToken`] from the metadata service as a SASL payload:
//! a single BSON document `{ "jwt": <token> }`, after which the
//! conversation is logically finished.

use bson::doc;
use zeroize::Zeroize;

use crate::error::{AuthError, Result};

use super::azure::AccessToken;
use super::mechanism::{MechanismBackend, SaslStep};

pub struct TokenBackend {
    token: AccessToken,
    sent: bool,
}

impl TokenBackend {
    pub fn new(token: AccessToken) -> Self {
        Self { token, sent: false }
    }
}

impl MechanismBackend for TokenBackend {
    fn name(&self) -> &'static str {
        "OIDC"
    }

    fn step(&mut self, _server_payload: &[u8]) -> Result<SaslStep> {
        if self.sent {
            return Err(AuthError::Protocol(
                "OIDC conversation already produced its only payload".into(),
            ));
        }
        if self.token.is_expired() {
            return Err(AuthError::Configuration(
                "access token has expired; fetch a fresh token before authenticating".into(),
            ));
        }
        self.sent = true;

        let body = doc! { "jwt": self.token.access_token() };
        let mut payload = Vec::new();
        if let Err(e) = body.to_writer(&mut payload) {
            payload.zeroize();
            return Err(AuthError::Parse(format!(
                "failed to encode token payload: {e}"
            )));
        }
        Ok(SaslStep::done(payload))
    }
}
