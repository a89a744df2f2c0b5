//! Cryptographic primitives: JWT signing/verification, password hashing, PKCE.

pub mod password;
pub mod pkce;
pub mod signer;

pub use password::PasswordHasher;
pub use signer::{ClaimsToSign, JwkKeySet, TokenSigner, VerifyError};
