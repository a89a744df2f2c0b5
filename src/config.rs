//! Server configuration.
//!
//! This mirrors the teacher's layered configuration style (plain structs
//! deserialized from the process environment, validated eagerly at
//! construction so a bad deployment fails fast instead of misbehaving at
//! request time) but scoped to the fields the authorization core actually
//! needs, per the configuration section of the specification.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while building a [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Immutable configuration for a running authorization server.
///
/// Built once at startup and shared read-only afterwards: the design notes
/// require that no process-wide mutable configuration state be visible to
/// handlers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// URL placed in the `iss` claim of every issued JWT.
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub auth_code_ttl: Duration,
    /// PEM-encoded RSA private key used to sign tokens.
    pub jwt_private_key_pem: Vec<u8>,
    /// PEM-encoded RSA public key used to verify tokens and published as a JWK.
    pub jwt_public_key_pem: Vec<u8>,
    /// Stable key identifier; if not configured, derived as the RFC 7638
    /// thumbprint of the public key by the Token Signer.
    pub jwt_kid: Option<String>,
    pub introspection_cache_ttl: Duration,
    pub bcrypt_cost: u32,
    pub clock_skew: Duration,
    /// Whether `code_challenge_method=plain` is accepted at all. This core
    /// only serves confidential clients (see §4.6), so RFC 7636's concern
    /// about `plain` weakening public clients does not directly apply, but
    /// operators may still want to forbid it outright.
    pub allow_plain_pkce: bool,
}

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 1800;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: u64 = 604_800;
const DEFAULT_AUTH_CODE_TTL_SECONDS: u64 = 600;
const DEFAULT_INTROSPECTION_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_BCRYPT_COST: u32 = 12;

impl ServerConfig {
    /// Build a [`ServerConfig`] directly, as a library caller would when
    /// wiring the core without going through environment variables.
    pub fn new(issuer: impl Into<String>, private_key_pem: Vec<u8>, public_key_pem: Vec<u8>) -> Self {
        Self {
            issuer: issuer.into(),
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            refresh_token_ttl: Duration::from_secs(DEFAULT_REFRESH_TOKEN_TTL_SECONDS),
            auth_code_ttl: Duration::from_secs(DEFAULT_AUTH_CODE_TTL_SECONDS),
            jwt_private_key_pem: private_key_pem,
            jwt_public_key_pem: public_key_pem,
            jwt_kid: None,
            introspection_cache_ttl: Duration::from_secs(DEFAULT_INTROSPECTION_CACHE_TTL_SECONDS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            clock_skew: Duration::ZERO,
            allow_plain_pkce: false,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Required: `OAUTH_ISSUER`, `OAUTH_JWT_PRIVATE_KEY_PEM`, `OAUTH_JWT_PUBLIC_KEY_PEM`
    /// (PEM text, not a file path — key material is expected to arrive via a
    /// secrets manager rather than a path on disk). All other fields fall
    /// back to the defaults in §6.5 of the specification.
    pub fn from_env() -> Result<Self, ConfigError> {
        let issuer = require_env("OAUTH_ISSUER")?;
        let private_key_pem = require_env("OAUTH_JWT_PRIVATE_KEY_PEM")?.into_bytes();
        let public_key_pem = require_env("OAUTH_JWT_PUBLIC_KEY_PEM")?.into_bytes();

        let mut config = Self::new(issuer, private_key_pem, public_key_pem);
        config.jwt_kid = env::var("OAUTH_JWT_KID").ok();
        config.access_token_ttl = duration_env(
            "OAUTH_ACCESS_TOKEN_TTL_SECONDS",
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        )?;
        config.refresh_token_ttl = duration_env(
            "OAUTH_REFRESH_TOKEN_TTL_SECONDS",
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        )?;
        config.auth_code_ttl =
            duration_env("OAUTH_AUTH_CODE_TTL_SECONDS", DEFAULT_AUTH_CODE_TTL_SECONDS)?;
        config.introspection_cache_ttl = duration_env(
            "OAUTH_INTROSPECTION_CACHE_TTL_SECONDS",
            DEFAULT_INTROSPECTION_CACHE_TTL_SECONDS,
        )?;
        config.bcrypt_cost = match env::var("OAUTH_BCRYPT_COST") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "OAUTH_BCRYPT_COST",
                reason: "not a positive integer".into(),
            })?,
            Err(_) => DEFAULT_BCRYPT_COST,
        };
        if config.bcrypt_cost < 12 {
            return Err(ConfigError::Invalid {
                name: "OAUTH_BCRYPT_COST",
                reason: "must be >= 12".into(),
            });
        }
        config.clock_skew = duration_env("OAUTH_CLOCK_SKEW_SECONDS", 0)?;
        config.allow_plain_pkce = env::var("OAUTH_ALLOW_PLAIN_PKCE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if url::Url::parse(&config.issuer).is_err() {
            return Err(ConfigError::Invalid {
                name: "OAUTH_ISSUER",
                reason: "not a valid URL".into(),
            });
        }

        Ok(config)
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn duration_env(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                name,
                reason: "not a non-negative integer number of seconds".into(),
            })?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}
