//! The closed set of grant requests the Token Service dispatches on.
//!
//! A tagged variant over grant types, each carrying exactly the
//! already-parsed parameters its grant needs (design note 9: no registry of
//! callable handlers, a plain `match` over this enum).

use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum GrantRequest {
    Password {
        client_id: Uuid,
        client_secret: String,
        username: String,
        password: String,
        scope: Option<String>,
    },
    AuthorizationCode {
        client_id: Uuid,
        client_secret: String,
        code: String,
        redirect_uri: String,
        code_verifier: String,
    },
    RefreshToken {
        client_id: Uuid,
        client_secret: String,
        refresh_token: String,
        scope: Option<String>,
    },
    ClientCredentials {
        client_id: Uuid,
        client_secret: String,
        scope: Option<String>,
    },
}
