//! Data model: the entities defined in the specification's data model section.

mod auth_code;
mod client;
mod revoked;
mod token;
mod user;

pub use auth_code::{AuthorizationCode, CodeChallengeMethod};
pub use client::{Client, GrantType};
pub use revoked::RevokedToken;
pub use token::{IntrospectionResponse, JwtClaims, TokenKind, TokenResponse};
pub use user::User;
