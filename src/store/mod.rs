//! Repository and cache ports: the persistence/transport contracts the
//! specification treats as external collaborators, plus in-memory reference
//! adapters used by tests, the demo binary, and (for the cache) an optional
//! Redis-backed adapter.

pub mod auth_code_store;
pub mod cache;
pub mod repository;
pub mod revoked_store;

pub use auth_code_store::{AuthCodeRepository, ConsumeOutcome, InMemoryAuthCodeRepository};
pub use cache::{IntrospectionCache, InMemoryIntrospectionCache};
pub use repository::{ClientRepository, InMemoryClientRepository, InMemoryUserRepository, UserRepository};
pub use revoked_store::{InMemoryRevokedTokenRepository, RevokedTokenRepository};
