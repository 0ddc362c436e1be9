//! Redis-backed `CacheStore` (C3 cross-process mode). Selected over the
//! default `InMemoryStore` when `REDIS_ENABLED` is true, so the result and
//! model caches are actually shared across replica processes instead of
//! living in one process's heap (§3/§5) — the whole point of a result cache
//! when more than one server/worker process is running.
//!
//! A cache failure must never fail a request (§4.3), so every Redis error
//! here is logged and degrades to a miss/no-op rather than propagating.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use r2e_cache::CacheStore;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

impl CacheStore for RedisStore {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            match conn.get::<_, Option<Vec<u8>>>(key).await {
                Ok(Some(bytes)) => Some(Bytes::from(bytes)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, key, "redis GET failed; treating as cache miss");
                    None
                }
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Bytes, ttl: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let seconds = ttl.as_secs().max(1);
            if let Err(e) = conn.set_ex::<_, _, ()>(key, value.to_vec(), seconds).await {
                tracing::warn!(error = %e, key, "redis SET failed");
            }
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            if let Err(e) = conn.del::<_, ()>(key).await {
                tracing::warn!(error = %e, key, "redis DEL failed");
            }
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.remove_by_prefix("").await;
        })
    }

    /// `KEYS {prefix}*` followed by a bulk `DEL`. Acceptable here because
    /// invalidation is scoped to one model's prediction entries, never the
    /// whole keyspace — a full `clear()` is the only caller that scans
    /// everything, and is reserved for tests.
    fn remove_by_prefix<'a>(&'a self, prefix: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let pattern = format!("{prefix}*");
            match conn.keys::<_, Vec<String>>(&pattern).await {
                Ok(keys) if !keys.is_empty() => {
                    if let Err(e) = conn.del::<_, ()>(keys).await {
                        tracing::warn!(error = %e, pattern, "redis DEL (prefix) failed");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, pattern, "redis KEYS failed"),
            }
        })
    }
}
