//! Grant handlers (§4.8): one module per grant, dispatched from
//! [`crate::service::TokenService`] over the closed [`params::GrantRequest`] enum.

pub mod authorization_code;
pub mod client_credentials;
pub mod params;
pub mod password;
pub mod refresh_token;

pub use params::GrantRequest;

use std::sync::Arc;

use chrono::Duration;

use crate::auth::{ClientAuthenticator, UserAuthenticator};
use crate::crypto::TokenSigner;
use crate::error::TokenServiceError;
use crate::model::Client;
use crate::store::{AuthCodeRepository, IntrospectionCache, RevokedTokenRepository};

/// Collaborators every grant handler needs, bundled so `TokenService`
/// doesn't have to pass five separate `Arc`s through each call.
#[derive(Clone)]
pub struct GrantDeps {
    pub client_auth: Arc<ClientAuthenticator>,
    pub user_auth: Arc<UserAuthenticator>,
    pub auth_codes: Arc<dyn AuthCodeRepository>,
    pub revoked: Arc<dyn RevokedTokenRepository>,
    pub cache: Arc<dyn IntrospectionCache>,
    pub signer: Arc<TokenSigner>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Upper bound on how long an introspection result may sit in the cache,
    /// independent of the token's own remaining lifetime (§4.5, §6.5).
    pub introspection_cache_ttl: Duration,
    pub allow_plain_pkce: bool,
}

/// Resolve the scope to grant: the requested scope if every token in it is
/// in `client.allowed_scopes`, else the client's default, else empty.
///
/// Per §4.8 ("validate requested scope is a subset of client's allowed
/// scopes; if absent, default to client's configured default").
pub(crate) fn resolve_scope(client: &Client, requested: Option<&str>) -> Result<String, TokenServiceError> {
    match requested {
        Some(requested) if !requested.trim().is_empty() => {
            if client.scope_allowed(requested) {
                Ok(requested.to_string())
            } else {
                Err(TokenServiceError::invalid_scope("requested scope exceeds client's allowed scopes"))
            }
        }
        _ => Ok(client.default_scope.clone().unwrap_or_default()),
    }
}

/// Whether every scope token in `requested` is present in `granted`.
pub(crate) fn scope_subset(requested: &str, granted: &str) -> bool {
    let granted: std::collections::HashSet<&str> = granted.split_whitespace().collect();
    requested.split_whitespace().all(|s| granted.contains(s))
}

/// Issue an access token plus a refresh token for the same subject/scope,
/// as every grant but Client Credentials does.
pub(crate) fn issue_pair(
    deps: &GrantDeps,
    sub: &str,
    client_id: &str,
    scope: &str,
) -> Result<(crate::model::TokenResponse, String, String), TokenServiceError> {
    use crate::crypto::ClaimsToSign;
    use crate::model::TokenKind;

    let (access_jwt, access_claims) = deps
        .signer
        .sign(ClaimsToSign {
            sub,
            aud: client_id,
            scope,
            token_type: TokenKind::Access,
            client_id,
            validity: deps.access_token_ttl,
        })
        .map_err(|_| TokenServiceError::server_error("failed to sign access token"))?;

    let (refresh_jwt, refresh_claims) = deps
        .signer
        .sign(ClaimsToSign {
            sub,
            aud: client_id,
            scope,
            token_type: TokenKind::Refresh,
            client_id,
            validity: deps.refresh_token_ttl,
        })
        .map_err(|_| TokenServiceError::server_error("failed to sign refresh token"))?;

    let response = crate::model::TokenResponse::new(access_jwt, deps.access_token_ttl.num_seconds(), scope.to_string())
        .with_refresh_token(refresh_jwt);

    Ok((response, access_claims.jti, refresh_claims.jti))
}

/// Issue an access token only, as the Client Credentials grant does.
pub(crate) fn issue_access_only(
    deps: &GrantDeps,
    sub: &str,
    client_id: &str,
    scope: &str,
) -> Result<crate::model::TokenResponse, TokenServiceError> {
    use crate::crypto::ClaimsToSign;
    use crate::model::TokenKind;

    let (access_jwt, _claims) = deps
        .signer
        .sign(ClaimsToSign {
            sub,
            aud: client_id,
            scope,
            token_type: TokenKind::Access,
            client_id,
            validity: deps.access_token_ttl,
        })
        .map_err(|_| TokenServiceError::server_error("failed to sign access token"))?;

    Ok(crate::model::TokenResponse::new(
        access_jwt,
        deps.access_token_ttl.num_seconds(),
        scope.to_string(),
    ))
}
