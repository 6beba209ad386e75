//! Signed session tokens.
//!
//! A session is a HS256 JWT carried in a cookie. Its claims mirror what the
//! platform keeps in a server-side session after login: the team name, the
//! team id, the admin flag and a per-session nonce used for CSRF checks.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for session token operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to encode session: {0}")]
    EncodingError(String),

    #[error("Failed to decode session: {0}")]
    DecodingError(String),

    #[error("Session has expired")]
    Expired,

    #[error("Invalid session")]
    Invalid,
}

/// Claims stored in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Team id.
    pub sub: i64,
    /// Team name shown as the logged-in username.
    pub username: String,
    /// Whether the team holds admin rights on the platform.
    pub admin: bool,
    /// Random per-session nonce.
    pub nonce: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Signs and validates session tokens with a shared secret.
#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
    leeway_secs: u64,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("lifetime_secs", &self.lifetime_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl SessionSigner {
    /// Creates a signer from the session secret.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Issues a session token for a freshly authenticated team.
    pub fn issue(
        &self,
        team_id: i64,
        username: &str,
        admin: bool,
        nonce: &str,
    ) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: team_id,
            username: username.to_string(),
            admin,
            nonce: nonce.to_string(),
            exp: (now + Duration::seconds(self.lifetime_secs)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::EncodingError(e.to_string()))
    }

    /// Validates a session token and returns its claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => SessionError::Invalid,
                _ => SessionError::DecodingError(e.to_string()),
            })
    }

    /// Session lifetime in seconds, used for the cookie Max-Age.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }
}
