//! The `AuthorizationCode` entity and its PKCE challenge method.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// PKCE challenge method presented at authorize time (RFC 7636 §4.3).
///
/// Method strings are matched case-sensitively at whatever boundary parses
/// them into this type; anything outside `plain`/`S256` is an unknown
/// method and the caller should reject with `invalid_grant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    Plain,
    S256,
}

/// A single-use, time-bounded authorization code record.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: Uuid,
    pub user_id: Uuid,
    pub redirect_uri: String,
    pub scope: String,
    pub code_challenge: String,
    pub code_challenge_method: CodeChallengeMethod,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    /// `jti`s of the tokens issued the first (and only legitimate) time this
    /// code was consumed. Populated on successful consumption so a replay
    /// can be traced back and those tokens revoked (RFC 6749 §4.1.2).
    pub issued_jtis: Vec<String>,
}

impl AuthorizationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
