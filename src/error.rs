//! Error types for docdb-auth

use thiserror::Error;

/// Main error type for the authentication core.
///
/// Every failure carries a domain (the enum variant), a stable numeric
/// [`code`](AuthError::code), and a human-readable message, so callers can
/// branch on the domain while logging the full detail.
#[derive(Error, Debug)]
pub enum AuthError {
    /// I/O error (network, file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (bad mechanism name, missing credential field,
    /// or a mechanism backend that was not compiled in)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Parse error (malformed token JSON, unexpected reply shape)
    #[error("parse error: {0}")]
    Parse(String),

    /// Transport error (a network round trip failed)
    #[error("transport error: {0}")]
    Transport(String),

    /// Protocol error (the server rejected a mechanism or payload, or the
    /// conversation ended in an unexpected state)
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl AuthError {
    /// Stable numeric code for the error domain.
    pub fn code(&self) -> u32 {
        match self {
            AuthError::Io(_) => 1,
            AuthError::Configuration(_) => 2,
            AuthError::Parse(_) => 3,
            AuthError::Transport(_) => 4,
            AuthError::Protocol(_) => 5,
        }
    }

    /// Name of the error domain, for structured logging.
    pub fn domain(&self) -> &'static str {
        match self {
            AuthError::Io(_) => "io",
            AuthError::Configuration(_) => "configuration",
            AuthError::Parse(_) => "parse",
            AuthError::Transport(_) => "transport",
            AuthError::Protocol(_) => "protocol",
        }
    }
}

/// Result type alias for AuthError
pub type Result<T> = std::result::Result<T, AuthError>;

impl From<serde_yaml::Error> for AuthError {
    fn from(err: serde_yaml::Error) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
