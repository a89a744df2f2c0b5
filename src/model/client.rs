//! The `Client` entity.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The four grants this core mediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    Password,
    AuthorizationCode,
    RefreshToken,
    ClientCredentials,
}

/// An OAuth 2.0 client registered with this authorization server.
///
/// Every client in this core is confidential: it MUST present a
/// `client_secret` on every grant (see §4.6 — public clients are not
/// supported).
#[derive(Debug, Clone)]
pub struct Client {
    pub id: Uuid,
    pub client_secret_hash: String,
    pub name: String,
    /// Exact-match redirect URIs, compared byte-for-byte including trailing slash.
    pub allowed_redirect_uris: Vec<String>,
    pub allowed_grant_types: HashSet<GrantType>,
    pub allowed_scopes: HashSet<String>,
    pub default_scope: Option<String>,
    /// Whether this client may present `code_challenge_method=plain`.
    pub allow_plain_pkce: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(
        client_secret_hash: impl Into<String>,
        name: impl Into<String>,
        allowed_grant_types: impl IntoIterator<Item = GrantType>,
        allowed_scopes: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_secret_hash: client_secret_hash.into(),
            name: name.into(),
            allowed_redirect_uris: Vec::new(),
            allowed_grant_types: allowed_grant_types.into_iter().collect(),
            allowed_scopes: allowed_scopes.into_iter().collect(),
            default_scope: None,
            allow_plain_pkce: false,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Whether `redirect_uri` matches one of the registered URIs, exactly.
    pub fn matches_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.allowed_redirect_uris.iter().any(|u| u == redirect_uri)
    }

    /// Whether every space-separated scope token in `requested` is present
    /// in `allowed_scopes`. An empty requested scope is always a subset.
    pub fn scope_allowed(&self, requested: &str) -> bool {
        requested
            .split_whitespace()
            .all(|scope| self.allowed_scopes.contains(scope))
    }
}
