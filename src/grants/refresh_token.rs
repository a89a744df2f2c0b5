//! The Refresh Token grant (§4.8): mandatory rotation on every use.

use uuid::Uuid;

use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::model::{GrantType, RevokedToken, TokenKind, TokenResponse};

use super::{issue_pair, scope_subset, GrantDeps};

pub async fn handle(
    deps: &GrantDeps,
    client_id: Uuid,
    client_secret: &str,
    refresh_token: &str,
    scope: Option<&str>,
    deadline: Deadline,
) -> Result<TokenResponse, TokenServiceError> {
    let client = deps
        .client_auth
        .authenticate(client_id, client_secret, GrantType::RefreshToken, deadline)
        .await?;

    let client_id_str = client.id.to_string();

    let claims = deps
        .signer
        .verify(refresh_token, &client_id_str)
        .map_err(|_| TokenServiceError::invalid_grant("invalid or expired refresh token"))?;

    if claims.token_type != TokenKind::Refresh {
        return Err(TokenServiceError::invalid_grant("token is not a refresh token"));
    }
    if claims.aud != client_id_str || claims.client_id != client_id_str {
        return Err(TokenServiceError::invalid_grant("refresh token was not issued to this client"));
    }

    let revoked = deps
        .revoked
        .is_revoked(&claims.jti, deadline)
        .await
        .map_err(|_| TokenServiceError::server_error("revocation repository fault"))?;
    if revoked {
        return Err(TokenServiceError::invalid_grant("refresh token has been revoked"));
    }

    let granted_scope = match scope {
        Some(requested) if !requested.trim().is_empty() => {
            if scope_subset(requested, &claims.scope) {
                requested.to_string()
            } else {
                return Err(TokenServiceError::invalid_scope(
                    "requested scope exceeds the refresh token's granted scope",
                ));
            }
        }
        _ => claims.scope.clone(),
    };

    let (response, _access_jti, _refresh_jti) = issue_pair(deps, &claims.sub, &client_id_str, &granted_scope)?;

    // Rotation: the prior refresh token is revoked before the response
    // returns, so a concurrent introspect can never observe it as active
    // again (§5 ordering guarantee).
    deps.revoked
        .record(
            RevokedToken {
                jti: claims.jti.clone(),
                expires_at: chrono::Utc::now() + deps.refresh_token_ttl,
            },
            deadline,
        )
        .await
        .map_err(|_| TokenServiceError::server_error("failed to record refresh-token rotation"))?;
    let _ = deps.cache.invalidate(refresh_token).await;

    Ok(response)
}
