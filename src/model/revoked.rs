//! The `RevokedToken` record.

use chrono::{DateTime, Utc};

/// A `jti` that has been explicitly revoked (or rotated out), plus the
/// original expiry so the backing store can reap it lazily once it would
/// have expired naturally anyway.
#[derive(Debug, Clone)]
pub struct RevokedToken {
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}
