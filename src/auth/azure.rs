//! Azure IMDS access-token provider.
//!
//! This module parses short-lived bearer tokens out of Azure Instance
//! Metadata Service (IMDS) responses and prepares the fixed HTTP request
//! the metadata endpoint requires. It performs no network I/O of its own:
//! the caller's HTTP layer sends [`ImdsMetadataRequest`] and hands the
//! response body to [`AccessToken::try_from_json`], which keeps the parser
//! testable in isolation.
//!
//! Tokens are not auto-refreshed. The issue time and TTL are exposed so the
//! caller can compute staleness and fetch a replacement.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{AuthError, Result};

/// Well-known non-routable address of the metadata service.
pub const IMDS_DEFAULT_HOST: &str = "169.254.169.254";

/// Fixed path of the IMDS token endpoint.
pub const IMDS_TOKEN_PATH: &str = "/metadata/identity/oauth2/token";

/// IMDS API version this crate requests.
pub const IMDS_API_VERSION: &str = "2018-02-01";

/// Default resource for which tokens are requested.
pub const IMDS_DEFAULT_RESOURCE: &str = "https://vault.azure.net";

/// A bearer token obtained from the Azure metadata service.
///
/// # Security
///
/// All string fields are zeroized when the token is dropped, on every exit
/// path; the [`Debug`] implementation redacts the token itself. The TTL is
/// relative to [`issued_at`](AccessToken::issued_at), which is recorded when
/// the response body is parsed.
#[derive(Clone, ZeroizeOnDrop)]
pub struct AccessToken {
    /// The bearer token string (zeroized on drop)
    access_token: Zeroizing<String>,
    /// The resource the token is valid for (zeroized on drop)
    resource: Zeroizing<String>,
    /// The HTTP token type, e.g. "Bearer" (zeroized on drop)
    token_type: Zeroizing<String>,
    /// Lifetime relative to the issue time
    #[zeroize(skip)]
    expires_in: Duration,
    /// When the response body was parsed
    #[zeroize(skip)]
    issued_at: DateTime<Utc>,
}

/// Raw shape of the IMDS token response body.
///
/// IMDS reports `expires_in` as a decimal string; some other identity
/// endpoints use a bare integer, so both forms are accepted.
#[derive(Deserialize)]
struct RawTokenResponse {
    access_token: String,
    resource: String,
    token_type: String,
    expires_in: RawExpiresIn,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpiresIn {
    Seconds(i64),
    Text(String),
}

impl RawExpiresIn {
    fn seconds(&self) -> Result<i64> {
        match self {
            RawExpiresIn::Seconds(v) => Ok(*v),
            RawExpiresIn::Text(s) => s.parse::<i64>().map_err(|_| {
                AuthError::Parse(format!("expires_in is not an integer: {s:?}"))
            }),
        }
    }
}

impl AccessToken {
    /// Try to parse an access token from an IMDS response body.
    ///
    /// Rejects missing fields, wrong field types, and a non-positive TTL.
    /// On failure nothing is constructed, so there is no partially owned
    /// token to clean up.
    pub fn try_from_json(body: &[u8]) -> Result<AccessToken> {
        let raw: RawTokenResponse = serde_json::from_slice(body)
            .map_err(|e| AuthError::Parse(format!("invalid IMDS token response: {e}")))?;
        let seconds = raw.expires_in.seconds()?;
        if seconds <= 0 {
            return Err(AuthError::Parse(format!(
                "IMDS token expires_in must be positive, got {seconds}"
            )));
        }
        Ok(AccessToken {
            access_token: Zeroizing::new(raw.access_token),
            resource: Zeroizing::new(raw.resource),
            token_type: Zeroizing::new(raw.token_type),
            expires_in: Duration::from_secs(seconds as u64),
            issued_at: Utc::now(),
        })
    }

    /// The bearer token string.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The resource the token is valid for.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The HTTP token type, usually "Bearer".
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime relative to the issue time.
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// When the token response was parsed.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Absolute expiry instant.
    ///
    /// An `expires_in` too large for the calendar saturates to the far
    /// future rather than overflowing; the metadata service controls the
    /// value, so it is never trusted to stay in range.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let seconds = self.expires_in.as_secs().min(i64::MAX as u64) as i64;
        chrono::Duration::try_seconds(seconds)
            .and_then(|ttl| self.issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the TTL has already elapsed.
    pub fn is_expired(&self) -> bool {
        self.expires_at() < Utc::now()
    }
}

// Custom Debug that never prints the token material.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("resource", &self.resource.as_str())
            .field("token_type", &self.token_type.as_str())
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// A prepared HTTP GET request for the IMDS token endpoint.
///
/// This is a stateless template: the caller's HTTP layer sends it (possibly
/// repeatedly) and feeds the body back to [`AccessToken::try_from_json`].
/// The `Metadata: true` header is mandated by the metadata service and must
/// be present on every request. Fetch retries are the caller's policy.
#[derive(Debug, Clone)]
pub struct ImdsMetadataRequest {
    /// HTTP method, always GET
    pub method: &'static str,
    /// Host of the metadata service
    pub host: String,
    /// Path plus query string of the token endpoint
    pub path_and_query: String,
    /// Required headers
    pub headers: Vec<(&'static str, &'static str)>,
}

impl ImdsMetadataRequest {
    /// Prepare a token request for the default resource.
    pub fn new() -> Self {
        Self::with_resource(IMDS_DEFAULT_RESOURCE)
    }

    /// Prepare a token request for a specific resource.
    pub fn with_resource(resource: &str) -> Self {
        Self {
            method: "GET",
            host: IMDS_DEFAULT_HOST.to_string(),
            path_and_query: format!(
                "{IMDS_TOKEN_PATH}?api-version={IMDS_API_VERSION}&resource={}",
                percent_encode(resource)
            ),
            headers: vec![("Metadata", "true"), ("Accept", "application/json")],
        }
    }

    /// Full request URL.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.host, self.path_and_query)
    }
}

impl Default for ImdsMetadataRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-encode a query-string value.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => {
                out.push('%');
                out.push_str(&format!("{other:02X}"));
            }
        }
    }
    out
}
