//! The User Authenticator (§4.7), used by the Password grant.

use std::sync::Arc;

use crate::crypto::PasswordHasher;
use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::model::User;
use crate::store::UserRepository;

/// Resolves and verifies a resource owner's username/password.
///
/// Unknown username and wrong password are both reported as `invalid_grant`
/// with the same static description, and both run the KDF exactly once, so
/// neither the branch taken nor the wall-clock time leaks which case occurred.
pub struct UserAuthenticator {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UserAuthenticator {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        deadline: Deadline,
    ) -> Result<User, TokenServiceError> {
        let user = self
            .users
            .find_by_username(username, deadline)
            .await
            .map_err(|_| TokenServiceError::server_error("user repository fault"))?;

        let user = match user {
            Some(user) if user.active => user,
            _ => {
                self.hasher.verify(password, self.hasher.dummy_hash());
                return Err(TokenServiceError::invalid_grant("invalid username or password"));
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(TokenServiceError::invalid_grant("invalid username or password"));
        }

        Ok(user)
    }
}
