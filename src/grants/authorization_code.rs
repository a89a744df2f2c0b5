//! The Authorization Code grant with PKCE (§4.8), including replay hardening.

use uuid::Uuid;

use crate::crypto::pkce;
use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::model::{GrantType, RevokedToken, TokenResponse};
use crate::store::ConsumeOutcome;

use super::{issue_pair, GrantDeps};

pub async fn handle(
    deps: &GrantDeps,
    client_id: Uuid,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
    deadline: Deadline,
) -> Result<TokenResponse, TokenServiceError> {
    let client = deps
        .client_auth
        .authenticate(client_id, client_secret, GrantType::AuthorizationCode, deadline)
        .await?;

    if code.is_empty() || redirect_uri.is_empty() || code_verifier.is_empty() {
        return Err(TokenServiceError::invalid_request(
            "code, redirect_uri and code_verifier are all required",
        ));
    }

    let outcome = deps
        .auth_codes
        .consume(code, deadline)
        .await
        .map_err(|_| TokenServiceError::server_error("auth-code repository fault"))?;

    let record = match outcome {
        Ok(record) => record,
        Err(ConsumeOutcome::AlreadyConsumed) => {
            // Replay: revoke every token previously issued from this code
            // (RFC 6749 §4.1.2).
            if let Ok(Some(prior)) = deps.auth_codes.get(code, deadline).await {
                for jti in prior.issued_jtis {
                    let _ = deps
                        .revoked
                        .record(
                            RevokedToken {
                                jti: jti.clone(),
                                expires_at: chrono::Utc::now() + deps.refresh_token_ttl,
                            },
                            deadline,
                        )
                        .await;
                    let _ = deps.cache.invalidate(&jti).await;
                }
            }
            return Err(TokenServiceError::invalid_grant("authorization code already used"));
        }
        Err(ConsumeOutcome::Expired) => return Err(TokenServiceError::invalid_grant("authorization code expired")),
        Err(ConsumeOutcome::NotFound) => return Err(TokenServiceError::invalid_grant("unknown authorization code")),
    };

    if record.client_id != client.id {
        return Err(TokenServiceError::invalid_grant("authorization code was not issued to this client"));
    }
    if record.redirect_uri != redirect_uri {
        return Err(TokenServiceError::invalid_grant("redirect_uri does not match the one used at authorization time"));
    }
    if !client.matches_redirect_uri(redirect_uri) {
        return Err(TokenServiceError::invalid_grant(
            "redirect_uri is not registered for this client",
        ));
    }
    if !pkce::is_valid_verifier_shape(code_verifier)
        || !pkce::verify(
            code_verifier,
            &record.code_challenge,
            record.code_challenge_method,
            client.allow_plain_pkce && deps.allow_plain_pkce,
        )
    {
        return Err(TokenServiceError::invalid_grant("PKCE verification failed"));
    }

    let (response, access_jti, refresh_jti) =
        issue_pair(deps, &record.user_id.to_string(), &client.id.to_string(), &record.scope)?;

    let _ = deps
        .auth_codes
        .record_issued_jtis(code, vec![access_jti, refresh_jti], deadline)
        .await;

    Ok(response)
}
