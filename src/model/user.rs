//! The `User` entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A resource owner who can authenticate via the Password grant.
///
/// `password_hash` is the opaque output of the [`crate::crypto::password::PasswordHasher`]
/// and is never serialized back out of this crate's public API.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Construct a new active user with a pre-hashed password.
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
