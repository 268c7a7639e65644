//! SASL PLAIN backend (RFC 4616).

use zeroize::Zeroizing;

use crate::error::{AuthError, Result};

use super::mechanism::{MechanismBackend, SaslStep};

/// Single-shot username/password backend.
///
/// PLAIN sends `authzid NUL authcid NUL passwd` in one payload; the
/// authorization identity is left empty so the server derives it from the
/// authentication identity.
pub struct PlainBackend {
    username: String,
    password: Zeroizing<String>,
    sent: bool,
}

impl PlainBackend {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            sent: false,
        }
    }
}

impl MechanismBackend for PlainBackend {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn step(&mut self, _server_payload: &[u8]) -> Result<SaslStep> {
        if self.sent {
            return Err(AuthError::Protocol(
                "PLAIN conversation already produced its only payload".into(),
            ));
        }
        self.sent = true;

        let mut payload = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        payload.push(0);
        payload.extend_from_slice(self.username.as_bytes());
        payload.push(0);
        payload.extend_from_slice(self.password.as_bytes());
        Ok(SaslStep::done(payload))
    }
}
