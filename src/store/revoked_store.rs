//! The `RevokedToken` repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::deadline::Deadline;
use crate::error::StoreError;
use crate::model::RevokedToken;

#[async_trait]
pub trait RevokedTokenRepository: Send + Sync {
    async fn record(&self, revoked: RevokedToken, deadline: Deadline) -> Result<(), StoreError>;
    async fn is_revoked(&self, jti: &str, deadline: Deadline) -> Result<bool, StoreError>;
}

/// Reference adapter. Expired entries are not actively purged here — a
/// production adapter backed by a real table would reap rows past `exp` in
/// the background, as the specification allows.
#[derive(Default, Clone)]
pub struct InMemoryRevokedTokenRepository {
    revoked: Arc<RwLock<HashMap<String, RevokedToken>>>,
}

impl InMemoryRevokedTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevokedTokenRepository for InMemoryRevokedTokenRepository {
    async fn record(&self, revoked: RevokedToken, deadline: Deadline) -> Result<(), StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        self.revoked.write().await.insert(revoked.jti.clone(), revoked);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str, deadline: Deadline) -> Result<bool, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        let revoked = self.revoked.read().await;
        Ok(match revoked.get(jti) {
            Some(entry) => entry.expires_at > Utc::now(),
            None => false,
        })
    }
}
