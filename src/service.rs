//! The Token Service façade (§4.9): dispatches grants, introspects, revokes.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use log::{debug, warn};

use crate::auth::{ClientAuthenticator, UserAuthenticator};
use crate::config::ServerConfig;
use crate::crypto::{PasswordHasher, TokenSigner};
use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::grants::{self, GrantDeps, GrantRequest};
use crate::model::{IntrospectionResponse, TokenResponse};
use crate::store::{AuthCodeRepository, ClientRepository, IntrospectionCache, RevokedTokenRepository, UserRepository};

fn to_chrono(d: StdDuration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::zero())
}

/// Orchestrates grant dispatch, introspection and revocation over a fixed
/// set of collaborators injected at construction (design note: no global DI
/// container, no process-wide singletons).
pub struct TokenService {
    deps: GrantDeps,
    clients: Arc<dyn ClientRepository>,
    hasher: PasswordHasher,
}

impl TokenService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &ServerConfig,
        signer: TokenSigner,
        users: Arc<dyn UserRepository>,
        clients: Arc<dyn ClientRepository>,
        auth_codes: Arc<dyn AuthCodeRepository>,
        revoked: Arc<dyn RevokedTokenRepository>,
        cache: Arc<dyn IntrospectionCache>,
    ) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let client_auth = Arc::new(ClientAuthenticator::new(clients.clone(), hasher.clone()));
        let user_auth = Arc::new(UserAuthenticator::new(users, hasher.clone()));

        let deps = GrantDeps {
            client_auth,
            user_auth,
            auth_codes,
            revoked,
            cache,
            signer: Arc::new(signer),
            access_token_ttl: to_chrono(config.access_token_ttl),
            refresh_token_ttl: to_chrono(config.refresh_token_ttl),
            introspection_cache_ttl: to_chrono(config.introspection_cache_ttl),
            allow_plain_pkce: config.allow_plain_pkce,
        };

        Self { deps, clients, hasher }
    }

    /// Dispatch a grant-agnostic request to its handler (§4.9).
    pub async fn issue(&self, request: GrantRequest, deadline: Deadline) -> Result<TokenResponse, TokenServiceError> {
        match request {
            GrantRequest::Password {
                client_id,
                client_secret,
                username,
                password,
                scope,
            } => {
                debug!("dispatching password grant for client {client_id}");
                grants::password::handle(
                    &self.deps,
                    client_id,
                    &client_secret,
                    &username,
                    &password,
                    scope.as_deref(),
                    deadline,
                )
                .await
            }
            GrantRequest::AuthorizationCode {
                client_id,
                client_secret,
                code,
                redirect_uri,
                code_verifier,
            } => {
                debug!("dispatching authorization_code grant for client {client_id}");
                grants::authorization_code::handle(
                    &self.deps,
                    client_id,
                    &client_secret,
                    &code,
                    &redirect_uri,
                    &code_verifier,
                    deadline,
                )
                .await
            }
            GrantRequest::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
                scope,
            } => {
                debug!("dispatching refresh_token grant for client {client_id}");
                grants::refresh_token::handle(
                    &self.deps,
                    client_id,
                    &client_secret,
                    &refresh_token,
                    scope.as_deref(),
                    deadline,
                )
                .await
            }
            GrantRequest::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => {
                debug!("dispatching client_credentials grant for client {client_id}");
                grants::client_credentials::handle(&self.deps, client_id, &client_secret, scope.as_deref(), deadline)
                    .await
            }
        }
    }

    /// Cache-first introspection (§4.5, §4.9). Every failure mode collapses
    /// to `{active:false}` so a caller can never distinguish why a token is
    /// inactive.
    pub async fn introspect(&self, token: &str, deadline: Deadline) -> IntrospectionResponse {
        match self.deps.cache.get(token).await {
            Ok(Some(cached)) => {
                debug!("introspection cache hit");
                return cached;
            }
            Ok(None) => debug!("introspection cache miss"),
            Err(e) => warn!("introspection cache unavailable, degrading to direct verification: {e}"),
        }

        let response = self.introspect_uncached(token, deadline).await;

        // Never cache a result past the token's own expiry, and never past
        // the configured cap either: whichever is sooner wins (§4.5, §6.5).
        let remaining = match &response {
            IntrospectionResponse::Active { exp, .. } => chrono::DateTime::from_timestamp(*exp, 0)
                .map(|exp| exp - chrono::Utc::now())
                .unwrap_or_else(Duration::zero),
            IntrospectionResponse::Inactive { .. } => Duration::zero(),
        };
        let ttl = remaining
            .max(Duration::zero())
            .min(self.deps.introspection_cache_ttl)
            .to_std()
            .unwrap_or(StdDuration::ZERO);
        if let Err(e) = self.deps.cache.put(token, response.clone(), ttl).await {
            warn!("failed to populate introspection cache: {e}");
        }

        response
    }

    async fn introspect_uncached(&self, token: &str, deadline: Deadline) -> IntrospectionResponse {
        // Audience is unknown up front; a token is "ours" for some client if
        // its signature and issuer check out, so verify against each claim's
        // own `aud` by decoding first and re-checking signature against that
        // audience. `verify_ignoring_expiry` lets us read the claims, then we
        // re-run the fully-enforcing `verify` against the claimed audience.
        let claims = match self.deps.signer.verify_ignoring_expiry(token) {
            Ok(claims) => claims,
            Err(_) => return IntrospectionResponse::inactive(),
        };

        if self.deps.signer.verify(token, &claims.aud).is_err() {
            return IntrospectionResponse::inactive();
        }

        match self.deps.revoked.is_revoked(&claims.jti, deadline).await {
            Ok(true) => return IntrospectionResponse::inactive(),
            Ok(false) => {}
            Err(e) => {
                warn!("revocation repository fault during introspection: {e}");
                return IntrospectionResponse::inactive();
            }
        }

        IntrospectionResponse::Active {
            active: true,
            scope: claims.scope,
            client_id: claims.client_id,
            username: None,
            sub: claims.sub,
            aud: claims.aud,
            exp: claims.exp,
            iat: claims.iat,
            token_type: claims.token_type,
        }
    }

    /// Revoke a token on behalf of an authenticated client (§4.9, RFC 7009).
    ///
    /// Always reports success unless the *request itself* is malformed
    /// (unknown client, bad client secret): an unknown, expired, or
    /// not-this-client's token is treated as already revoked.
    pub async fn revoke(
        &self,
        client_id: uuid::Uuid,
        client_secret: &str,
        token: &str,
        deadline: Deadline,
    ) -> Result<(), TokenServiceError> {
        let client = self
            .clients
            .find_by_id(client_id, deadline)
            .await
            .map_err(|_| TokenServiceError::server_error("client repository fault"))?;
        let client = match client {
            Some(client) if client.active => client,
            _ => return Err(TokenServiceError::invalid_client("unknown or inactive client")),
        };

        if !self.hasher.verify(client_secret, &client.client_secret_hash) {
            return Err(TokenServiceError::invalid_client("bad client secret"));
        }

        let claims = match self.deps.signer.verify_ignoring_expiry(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(()),
        };

        if claims.client_id != client.id.to_string() && claims.aud != client.id.to_string() {
            // Not this client's token: report success without acting on it.
            return Ok(());
        }

        let exp = chrono::DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(chrono::Utc::now);
        self.deps
            .revoked
            .record(crate::model::RevokedToken { jti: claims.jti.clone(), expires_at: exp }, deadline)
            .await
            .map_err(|_| TokenServiceError::server_error("failed to record revocation"))?;

        // Invalidate before returning: a subsequent introspect must never
        // see a stale active:true (§5).
        if let Err(e) = self.deps.cache.invalidate(token).await {
            warn!("failed to invalidate cache entry on revoke: {e}");
        }

        Ok(())
    }

    /// The JWK set this service's signer publishes.
    pub fn jwk_set(&self) -> Result<crate::crypto::JwkKeySet, anyhow::Error> {
        self.deps.signer.jwk_set()
    }
}
