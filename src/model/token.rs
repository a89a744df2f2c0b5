//! JWT claim shape and the wire-level response bodies of §6.1.

use serde::{Deserialize, Serialize};

/// `token_type` claim distinguishing access tokens from refresh tokens.
///
/// A refresh JWT carrying `token_type=access` (or vice versa) is rejected by
/// the grant that expects the other kind, independent of signature validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The JWT claim set signed and verified by the Token Signer.
///
/// Field names match RFC 7519's registered claims plus the `scope`,
/// `token_type` and `client_id` extensions this protocol relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    /// `user_id` for user-bound grants, `client_id` for `client_credentials`.
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub scope: String,
    pub token_type: TokenKind,
    pub client_id: String,
}

/// `POST /oauth2/token` success body.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

impl TokenResponse {
    pub fn new(access_token: String, expires_in: i64, scope: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            expires_in,
            refresh_token: None,
            scope,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: String) -> Self {
        self.refresh_token = Some(refresh_token);
        self
    }
}

/// RFC 7662 introspection response. `active: false` never carries any other
/// field, so that failure reasons cannot be inferred from the shape alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntrospectionResponse {
    Active {
        active: bool,
        scope: String,
        client_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        sub: String,
        aud: String,
        exp: i64,
        iat: i64,
        token_type: TokenKind,
    },
    Inactive {
        active: bool,
    },
}

impl IntrospectionResponse {
    pub fn inactive() -> Self {
        IntrospectionResponse::Inactive { active: false }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, IntrospectionResponse::Active { active: true, .. })
    }
}
