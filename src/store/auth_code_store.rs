//! The Auth-Code Store (§4.4): single-use, time-bounded authorization codes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::deadline::Deadline;
use crate::error::StoreError;
use crate::model::AuthorizationCode;

/// Outcome of [`AuthCodeRepository::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    AlreadyConsumed,
    Expired,
    NotFound,
}

#[async_trait]
pub trait AuthCodeRepository: Send + Sync {
    /// Insert a freshly issued code. Fails with [`StoreError::AlreadyExists`]
    /// if the code string collides (it shouldn't, given ≥128 bits of entropy).
    async fn put(&self, record: AuthorizationCode, deadline: Deadline) -> Result<(), StoreError>;

    /// Fetch a code without consuming it. Expired codes are reported as
    /// absent, per §4.4.
    async fn get(&self, code: &str, deadline: Deadline) -> Result<Option<AuthorizationCode>, StoreError>;

    /// Atomically transition `consumed: false -> true`. Linearizable: under
    /// concurrent callers racing the same code, exactly one receives
    /// `Ok(Some(record))`.
    async fn consume(
        &self,
        code: &str,
        deadline: Deadline,
    ) -> Result<Result<AuthorizationCode, ConsumeOutcome>, StoreError>;

    /// Record the `jti`s issued from a successful consumption, so a replay
    /// of the same code can revoke them (RFC 6749 §4.1.2).
    async fn record_issued_jtis(&self, code: &str, jtis: Vec<String>, deadline: Deadline) -> Result<(), StoreError>;
}

/// Reference adapter backed by a single mutex-guarded map. Serializing the
/// whole map behind one lock is what makes `consume` linearizable without
/// any per-row locking scheme; it is fine for the code-store's write volume
/// (one row touched per authorization, consumed exactly once).
#[derive(Default, Clone)]
pub struct InMemoryAuthCodeRepository {
    codes: Arc<Mutex<HashMap<String, AuthorizationCode>>>,
}

impl InMemoryAuthCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthCodeRepository for InMemoryAuthCodeRepository {
    async fn put(&self, record: AuthorizationCode, deadline: Deadline) -> Result<(), StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        let mut codes = self.codes.lock().await;
        if codes.contains_key(&record.code) {
            return Err(StoreError::AlreadyExists);
        }
        codes.insert(record.code.clone(), record);
        Ok(())
    }

    async fn get(&self, code: &str, deadline: Deadline) -> Result<Option<AuthorizationCode>, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        let codes = self.codes.lock().await;
        Ok(codes
            .get(code)
            .filter(|record| !record.is_expired(Utc::now()))
            .cloned())
    }

    async fn consume(
        &self,
        code: &str,
        deadline: Deadline,
    ) -> Result<Result<AuthorizationCode, ConsumeOutcome>, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        let mut codes = self.codes.lock().await;
        let Some(record) = codes.get_mut(code) else {
            return Ok(Err(ConsumeOutcome::NotFound));
        };
        if record.is_expired(Utc::now()) {
            return Ok(Err(ConsumeOutcome::Expired));
        }
        if record.consumed {
            return Ok(Err(ConsumeOutcome::AlreadyConsumed));
        }
        record.consumed = true;
        Ok(Ok(record.clone()))
    }

    async fn record_issued_jtis(&self, code: &str, jtis: Vec<String>, deadline: Deadline) -> Result<(), StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        let mut codes = self.codes.lock().await;
        if let Some(record) = codes.get_mut(code) {
            record.issued_jtis = jtis;
        }
        Ok(())
    }
}
