//! The Client Authenticator (§4.6).

use std::sync::Arc;

use crate::crypto::PasswordHasher;
use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::model::{Client, GrantType};
use crate::store::ClientRepository;
use uuid::Uuid;

/// Resolves and verifies a client's credentials and grant-type allowance.
///
/// Every client in this core is confidential (§4.6): there is no concept of
/// a public client presenting no secret.
pub struct ClientAuthenticator {
    clients: Arc<dyn ClientRepository>,
    hasher: PasswordHasher,
}

impl ClientAuthenticator {
    pub fn new(clients: Arc<dyn ClientRepository>, hasher: PasswordHasher) -> Self {
        Self { clients, hasher }
    }

    /// Authenticate `client_id`/`client_secret` and confirm `grant_type` is
    /// allowed for that client.
    pub async fn authenticate(
        &self,
        client_id: Uuid,
        client_secret: &str,
        grant_type: GrantType,
        deadline: Deadline,
    ) -> Result<Client, TokenServiceError> {
        let client = self
            .clients
            .find_by_id(client_id, deadline)
            .await
            .map_err(|_| TokenServiceError::server_error("client repository fault"))?;

        let client = match client {
            Some(client) if client.active => client,
            _ => {
                // Still run the KDF so absent/inactive clients take the same
                // wall-clock time as a present-but-wrong-secret client.
                self.hasher.verify(client_secret, self.hasher.dummy_hash());
                return Err(TokenServiceError::invalid_client("unknown or inactive client"));
            }
        };

        if !self.hasher.verify(client_secret, &client.client_secret_hash) {
            return Err(TokenServiceError::invalid_client("bad client secret"));
        }

        if !client.allowed_grant_types.contains(&grant_type) {
            return Err(TokenServiceError::unauthorized_client(
                "client is not allowed to use the requested grant type",
            ));
        }

        Ok(client)
    }
}
