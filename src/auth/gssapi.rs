//! GSSAPI backend over `cross-krb5`.
//!
//! `cross-krb5` wraps the platform security library (MIT/Heimdal GSSAPI on
//! unix, SSPI on windows), so a single backend covers both library-backed
//! and platform-native Kerberos. Only compiled with the `gssapi` feature;
//! without it, mechanism selection reports a configuration error instead.

use cross_krb5::{ClientCtx, InitiateFlags, PendingClientCtx, Step};

use crate::error::{AuthError, Result};
use crate::topology::ServerAddress;

use super::credential::Credential;
use super::mechanism::{MechanismBackend, SaslStep};

/// Default service name used to build the target principal.
const DEFAULT_SERVICE_NAME: &str = "docdb";

enum State {
    Start { spn: String },
    Pending(PendingClientCtx),
    Established(ClientCtx),
    Failed,
}

pub struct GssapiBackend {
    state: State,
}

impl GssapiBackend {
    /// Prepare a backend targeting `service/<host>` on the node at `address`.
    pub fn new(credential: &Credential, address: &ServerAddress) -> Result<Self> {
        let service = credential.service_name().unwrap_or(DEFAULT_SERVICE_NAME);
        let spn = format!("{service}/{}", address.host);
        Ok(Self {
            state: State::Start { spn },
        })
    }
}

impl MechanismBackend for GssapiBackend {
    fn name(&self) -> &'static str {
        "GSSAPI"
    }

    fn step(&mut self, server_payload: &[u8]) -> Result<SaslStep> {
        match std::mem::replace(&mut self.state, State::Failed) {
            State::Start { spn } => {
                let (pending, initial) =
                    ClientCtx::new(InitiateFlags::empty(), None, &spn, None).map_err(|e| {
                        AuthError::Configuration(format!(
                            "failed to initiate GSSAPI context for {spn}: {e}"
                        ))
                    })?;
                self.state = State::Pending(pending);
                Ok(SaslStep::more(initial.to_vec()))
            }
            State::Pending(pending) => match pending.step(server_payload) {
                Ok(Step::Continue((pending, payload))) => {
                    self.state = State::Pending(pending);
                    Ok(SaslStep::more(payload.to_vec()))
                }
                Ok(Step::Finished((ctx, payload))) => {
                    self.state = State::Established(ctx);
                    let bytes = payload.map(|p| p.to_vec()).unwrap_or_default();
                    Ok(SaslStep::done(bytes))
                }
                Err(e) => Err(AuthError::Protocol(format!(
                    "GSSAPI rejected the server challenge: {e}"
                ))),
            },
            State::Established(_) | State::Failed => Err(AuthError::Protocol(
                "GSSAPI conversation already completed".into(),
            )),
        }
    }
}
