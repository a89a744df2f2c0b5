//! The Introspection Cache (§4.5): read-through, TTL-bounded, invalidated
//! synchronously on revocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::model::IntrospectionResponse;

/// A key/value cache keyed by the token string, storing introspection
/// responses. Every method returns `Result` so a transport fault can be
/// reported; per §4.5 the caller (the Token Service) treats any `Err` as a
/// miss and degrades to direct verification rather than failing the request.
#[async_trait]
pub trait IntrospectionCache: Send + Sync {
    async fn get(&self, token: &str) -> Result<Option<IntrospectionResponse>, anyhow::Error>;
    async fn put(&self, token: &str, value: IntrospectionResponse, ttl: Duration) -> Result<(), anyhow::Error>;
    /// Remove an entry synchronously. The revoke handler awaits this before
    /// returning its response, so a subsequent introspect can never observe
    /// a stale `active: true`.
    async fn invalidate(&self, token: &str) -> Result<(), anyhow::Error>;
}

struct Entry {
    value: IntrospectionResponse,
    expires_at: Instant,
}

/// Reference adapter: an in-process map with lazily-checked expiry.
#[derive(Default, Clone)]
pub struct InMemoryIntrospectionCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryIntrospectionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntrospectionCache for InMemoryIntrospectionCache {
    async fn get(&self, token: &str) -> Result<Option<IntrospectionResponse>, anyhow::Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(token).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.value.clone())
            } else {
                None
            }
        }))
    }

    async fn put(&self, token: &str, value: IntrospectionResponse, ttl: Duration) -> Result<(), anyhow::Error> {
        let mut entries = self.entries.write().await;
        entries.insert(
            token.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, token: &str) -> Result<(), anyhow::Error> {
        self.entries.write().await.remove(token);
        Ok(())
    }
}

/// Redis-backed cache transport, the production-shaped adapter (mirrors the
/// teacher's `redis` + `tokio-comp` usage). Values round-trip as JSON; a
/// natural Redis `EX` TTL backs the cache's own expiry so a crashed process
/// never leaves a stale entry behind indefinitely.
#[cfg(feature = "redis-cache")]
pub mod redis_backed {
    use super::*;
    use redis::AsyncCommands;

    pub struct RedisIntrospectionCache {
        client: redis::Client,
        key_prefix: String,
    }

    impl RedisIntrospectionCache {
        pub fn new(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self, anyhow::Error> {
            Ok(Self {
                client: redis::Client::open(redis_url)?,
                key_prefix: key_prefix.into(),
            })
        }

        fn key(&self, token: &str) -> String {
            format!("{}:{}", self.key_prefix, token)
        }
    }

    #[async_trait]
    impl IntrospectionCache for RedisIntrospectionCache {
        async fn get(&self, token: &str) -> Result<Option<IntrospectionResponse>, anyhow::Error> {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let raw: Option<String> = conn.get(self.key(token)).await?;
            Ok(match raw {
                Some(raw) => Some(serde_json::from_str(&raw)?),
                None => None,
            })
        }

        async fn put(&self, token: &str, value: IntrospectionResponse, ttl: Duration) -> Result<(), anyhow::Error> {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let raw = serde_json::to_string(&value)?;
            let _: () = conn.set_ex(self.key(token), raw, ttl.as_secs().max(1)).await?;
            Ok(())
        }

        async fn invalidate(&self, token: &str) -> Result<(), anyhow::Error> {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let _: () = conn.del(self.key(token)).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TokenKind;

    fn sample_active() -> IntrospectionResponse {
        IntrospectionResponse::Active {
            active: true,
            scope: "read".to_string(),
            client_id: "client-1".to_string(),
            username: None,
            sub: "user-1".to_string(),
            aud: "client-1".to_string(),
            exp: 0,
            iat: 0,
            token_type: TokenKind::Access,
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = InMemoryIntrospectionCache::new();
        cache.put("tok", sample_active(), Duration::from_secs(60)).await.unwrap();
        let got = cache.get("tok").await.unwrap();
        assert!(got.unwrap().is_active());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = InMemoryIntrospectionCache::new();
        cache.put("tok", sample_active(), Duration::from_secs(60)).await.unwrap();
        cache.invalidate("tok").await.unwrap();
        assert!(cache.get("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_a_miss() {
        let cache = InMemoryIntrospectionCache::new();
        cache.put("tok", sample_active(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("tok").await.unwrap().is_none());
    }
}
