//! Error taxonomy for the authorization core.
//!
//! [`ErrorKind`] enumerates the RFC-facing error surfaces from the protocol
//! boundary (see the error handling design in the specification): grant
//! handlers and the [`crate::service::TokenService`] façade both collapse
//! their internal failures down to one of these kinds before returning.
//! Underlying causes (repository faults, cache faults) are logged via
//! `log::error!` and never exposed in `error_description`.

use thiserror::Error;

/// RFC-facing error kind, independent of any HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("invalid_request")]
    InvalidRequest,
    #[error("invalid_client")]
    InvalidClient,
    #[error("invalid_grant")]
    InvalidGrant,
    #[error("unauthorized_client")]
    UnauthorizedClient,
    #[error("unsupported_grant_type")]
    UnsupportedGrantType,
    #[error("invalid_scope")]
    InvalidScope,
    #[error("access_denied")]
    AccessDenied,
    #[error("server_error")]
    ServerError,
}

impl ErrorKind {
    /// The wire string used in the `error` field of a protocol error response.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InvalidClient => "invalid_client",
            ErrorKind::InvalidGrant => "invalid_grant",
            ErrorKind::UnauthorizedClient => "unauthorized_client",
            ErrorKind::UnsupportedGrantType => "unsupported_grant_type",
            ErrorKind::InvalidScope => "invalid_scope",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::ServerError => "server_error",
        }
    }
}

/// Error surfaced by the Token Service façade and its grant handlers.
///
/// `description` is diagnostic only and MUST NOT be derived from secret
/// material (passwords, client secrets, bearer/refresh tokens); handlers
/// populate it with static, non-identifying text.
#[derive(Debug, Error)]
#[error("{kind}: {description}")]
pub struct TokenServiceError {
    pub kind: ErrorKind,
    pub description: &'static str,
}

impl TokenServiceError {
    pub fn new(kind: ErrorKind, description: &'static str) -> Self {
        Self { kind, description }
    }

    pub fn invalid_request(description: &'static str) -> Self {
        Self::new(ErrorKind::InvalidRequest, description)
    }

    pub fn invalid_client(description: &'static str) -> Self {
        Self::new(ErrorKind::InvalidClient, description)
    }

    pub fn invalid_grant(description: &'static str) -> Self {
        Self::new(ErrorKind::InvalidGrant, description)
    }

    pub fn unauthorized_client(description: &'static str) -> Self {
        Self::new(ErrorKind::UnauthorizedClient, description)
    }

    pub fn unsupported_grant_type(description: &'static str) -> Self {
        Self::new(ErrorKind::UnsupportedGrantType, description)
    }

    pub fn invalid_scope(description: &'static str) -> Self {
        Self::new(ErrorKind::InvalidScope, description)
    }

    pub fn server_error(description: &'static str) -> Self {
        Self::new(ErrorKind::ServerError, description)
    }
}

/// Fault reported by a repository or cache adapter.
///
/// This is the error type ports speak; handlers fold every variant into
/// [`ErrorKind::ServerError`] at the façade boundary (or ignore it, for the
/// cache, which degrades silently to direct verification per the spec).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("already exists")]
    AlreadyExists,
    #[error("not found")]
    NotFound,
}
