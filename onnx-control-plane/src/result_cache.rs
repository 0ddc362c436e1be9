//! Prediction result cache (C3): an optional, best-effort layer in front of
//! the inference engine. A cache failure is never allowed to fail a request —
//! every fallible operation here degrades to a cache miss instead of
//! propagating an error (§4.3).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use md5::{Digest, Md5};
use r2e_cache::CacheStore;
use serde_json::Value as Json;

/// Snapshot of cache effectiveness, exposed via the health/metrics endpoint (C9).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
}

impl CacheMetrics {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// What a prediction result cache entry actually stores: the engine's raw
/// output plus the inference time it took to produce, so a cache hit can
/// report the original cost instead of a fabricated zero.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedPrediction {
    pub output: Json,
    pub inference_time_ms: f64,
}

pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    key_prefix: String,
    ttl: Duration,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, key_prefix: impl Into<String>, ttl: Duration, enabled: bool) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            ttl,
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `{key_prefix}:prediction:{model_id}:{fingerprint}` — the first 16 hex
    /// characters of the MD5 digest of the canonical-JSON encoding of `input`.
    fn key_for(&self, model_id: &str, input: &Json) -> String {
        let canonical = canonical_json(input);
        let mut hasher = Md5::new();
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        let fingerprint = hex::encode(digest);
        format!("{}:prediction:{}:{}", self.key_prefix, model_id, &fingerprint[..16])
    }

    fn prefix_for_model(&self, model_id: &str) -> String {
        format!("{}:prediction:{}:", self.key_prefix, model_id)
    }

    /// Returns the cached output alongside the inference time recorded when
    /// it was first computed, so a cache hit can report a true `elapsed_ms`
    /// rather than `0.0` (the prediction log always carries a real figure).
    pub async fn lookup(&self, model_id: &str, input: &Json) -> Option<CachedPrediction> {
        if !self.enabled {
            return None;
        }
        let key = self.key_for(model_id, input);
        match self.store.get(&key).await {
            Some(bytes) => match serde_json::from_slice::<CachedPrediction>(&bytes) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "discarding corrupt cache entry");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn store(&self, model_id: &str, input: &Json, output: &Json, inference_time_ms: f64) {
        if !self.enabled {
            return;
        }
        let key = self.key_for(model_id, input);
        let entry = CachedPrediction {
            output: output.clone(),
            inference_time_ms,
        };
        match serde_json::to_vec(&entry) {
            Ok(bytes) => self.store.set(&key, bytes.into(), self.ttl).await,
            Err(e) => tracing::warn!(error = %e, "failed to serialize prediction for caching"),
        }
    }

    /// Evict every cached prediction for `model_id` (called on archive/rollback).
    pub async fn invalidate_model(&self, model_id: &str) {
        self.store.remove_by_prefix(&self.prefix_for_model(model_id)).await;
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn reset_metrics(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Recursively sort object keys so two JSON values that differ only in key
/// order hash identically, then encode with `serde_json`'s compact (tight
/// separator) formatting.
fn canonical_json(value: &Json) -> String {
    serde_json::to_string(&sorted(value)).unwrap_or_default()
}

fn sorted(value: &Json) -> Json {
    match value {
        Json::Object(map) => {
            let mut entries: Vec<(&String, &Json)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), sorted(v));
            }
            Json::Object(out)
        }
        Json::Array(items) => Json::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// A small read-through cache for `GET /models/{id}` fetches (§6). Separate
/// from [`ResultCache`] because it caches whole model rows, not prediction
/// fingerprints, and its own TTL (`CACHE_MODEL_TTL`) is reported back to the
/// caller as a `Cache-Control: max-age=<ttl>` header rather than tracked with
/// hit/miss counters.
pub struct ModelCache {
    store: Arc<dyn CacheStore>,
    key_prefix: String,
    ttl: Duration,
}

impl ModelCache {
    pub fn new(store: Arc<dyn CacheStore>, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    fn key_for(&self, model_id: &str) -> String {
        format!("{}:model:{}", self.key_prefix, model_id)
    }

    pub async fn lookup(&self, model_id: &str) -> Option<crate::catalog::Model> {
        let bytes = self.store.get(&self.key_for(model_id)).await?;
        serde_json::from_slice(&bytes).ok()
    }

    pub async fn store(&self, model: &crate::catalog::Model) {
        if let Ok(bytes) = serde_json::to_vec(model) {
            self.store.set(&self.key_for(&model.id.to_string()), bytes.into(), self.ttl).await;
        }
    }

    /// Called whenever a model row is mutated (upload, validate, update,
    /// delete) so a stale row is never served past its own TTL.
    pub async fn invalidate(&self, model_id: &str) {
        self.store.remove(&self.key_for(model_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2e_cache::InMemoryStore;
    use serde_json::json;

    fn cache() -> ResultCache {
        ResultCache::new(Arc::new(InMemoryStore::new()), "cache", Duration::from_secs(60), true)
    }

    #[tokio::test]
    async fn lookup_miss_then_hit() {
        let cache = cache();
        let input = json!({"a": 1, "b": 2});
        assert!(cache.lookup("model-1", &input).await.is_none());
        cache.store("model-1", &input, &json!({"result": 42}), 12.5).await;
        let hit = cache.lookup("model-1", &input).await.unwrap();
        assert_eq!(hit.output, json!({"result": 42}));
        assert_eq!(hit.inference_time_ms, 12.5);
        assert_eq!(cache.metrics().hits, 1);
        assert_eq!(cache.metrics().misses, 1);
    }

    #[tokio::test]
    async fn key_is_order_independent() {
        let cache = cache();
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(cache.key_for("m", &a), cache.key_for("m", &b));
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let cache = ResultCache::new(Arc::new(InMemoryStore::new()), "cache", Duration::from_secs(60), false);
        let input = json!({"a": 1});
        cache.store("m", &input, &json!({"r": 1}), 1.0).await;
        assert!(cache.lookup("m", &input).await.is_none());
        assert_eq!(cache.metrics().hits, 0);
        assert_eq!(cache.metrics().misses, 0);
    }

    #[tokio::test]
    async fn invalidate_model_clears_only_that_models_entries() {
        let cache = cache();
        let input = json!({"a": 1});
        cache.store("model-1", &input, &json!({"r": 1}), 1.0).await;
        cache.store("model-2", &input, &json!({"r": 2}), 2.0).await;
        cache.invalidate_model("model-1").await;
        assert!(cache.lookup("model-1", &input).await.is_none());
        assert_eq!(cache.lookup("model-2", &input).await.unwrap().output, json!({"r": 2}));
    }

    fn sample_model() -> crate::catalog::Model {
        crate::catalog::Model {
            id: uuid::Uuid::new_v4(),
            name: "m".into(),
            description: None,
            version: "1.0.0".into(),
            state: crate::catalog::ModelState::Pending,
            blob_path: None,
            size_bytes: None,
            content_hash: None,
            input_schema: None,
            output_schema: None,
            model_metadata: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn model_cache_round_trips_and_invalidates() {
        let cache = ModelCache::new(Arc::new(InMemoryStore::new()), "cache", Duration::from_secs(300));
        let model = sample_model();
        assert!(cache.lookup(&model.id.to_string()).await.is_none());
        cache.store(&model).await;
        let hit = cache.lookup(&model.id.to_string()).await.unwrap();
        assert_eq!(hit.id, model.id);
        cache.invalidate(&model.id.to_string()).await;
        assert!(cache.lookup(&model.id.to_string()).await.is_none());
    }
}
