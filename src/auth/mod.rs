//! Credential authenticators: the Client Authenticator (§4.6) and User
//! Authenticator (§4.7) used by the grant handlers.

pub mod client_authenticator;
pub mod user_authenticator;

pub use client_authenticator::ClientAuthenticator;
pub use user_authenticator::UserAuthenticator;
