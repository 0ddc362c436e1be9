//! Prediction orchestrator (C5): the synchronous inference path. Three
//! explicit phases that never interleave — Decisions, Execution, Record.
//! Concentrating every policy decision in phase 1 means a new policy (a
//! confidence threshold, a shadow call) is a visible change here, never a
//! change hidden inside the engine adapter.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::ModelCatalog;
use crate::engine::InferenceEngine;
use crate::error::AppError;
use crate::predictions::{NewPrediction, Prediction, PredictionLog};
use crate::result_cache::ResultCache;
use crate::storage::ArtifactStore;

/// Whether the prediction was served from the result cache or the engine —
/// callers use this to set the `X-Cache` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

pub struct PredictOutcome {
    pub prediction: Prediction,
    pub cache: CacheOutcome,
}

pub struct PredictRequest<'a> {
    pub model_id: Uuid,
    pub input: &'a Json,
    pub skip_cache: bool,
    pub request_id: Option<&'a str>,
    pub client_addr: Option<&'a str>,
}

#[derive(Clone)]
pub struct PredictionOrchestrator {
    pool: PgPool,
    engine: Arc<InferenceEngine>,
    storage: ArtifactStore,
    cache: Arc<ResultCache>,
}

impl PredictionOrchestrator {
    pub fn new(pool: PgPool, engine: Arc<InferenceEngine>, storage: ArtifactStore, cache: Arc<ResultCache>) -> Self {
        Self {
            pool,
            engine,
            storage,
            cache,
        }
    }

    pub async fn predict(&self, req: PredictRequest<'_>) -> Result<PredictOutcome, AppError> {
        // --- Phase 1: Decisions -------------------------------------------
        let model = ModelCatalog::get_by_id(&self.pool, req.model_id).await?;
        // D1: fail fast if the model has not crossed the commitment boundary.
        ModelCatalog::assert_committed(&model)?;
        // D2: post-commitment invariant — a committed model must carry a
        // blob path. A missing one here is a corruption of state, not a
        // user error, so it is a 500 rather than reusing assert_committed's
        // 400/409 mapping.
        let Some(blob_path) = model.blob_path.as_deref() else {
            return Err(AppError::Internal(format!(
                "model {} is READY but has no blob_path",
                model.id
            )));
        };

        let model_key = model.id.to_string();
        let cached = if req.skip_cache {
            None
        } else {
            self.cache.lookup(&model_key, req.input).await
        };

        // --- Phase 2: Execution ---------------------------------------------
        let (output, elapsed_ms, cache_outcome) = if let Some(cached) = cached {
            (cached.output, cached.inference_time_ms, CacheOutcome::Hit)
        } else {
            let resolved = self.storage.resolve(blob_path)?;
            let named_inputs: HashMap<String, Json> = req
                .input
                .as_object()
                .ok_or_else(|| AppError::BadRequest("input must be a JSON object".to_string()))?
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let outcome = self.engine.run(&resolved, &named_inputs).await?;
            let output = serde_json::to_value(&outcome.outputs).unwrap_or(Json::Null);
            self.cache.store(&model_key, req.input, &output, outcome.elapsed_ms).await;
            (output, outcome.elapsed_ms, CacheOutcome::Miss)
        };

        // --- Phase 3: Record -------------------------------------------------
        let prediction = PredictionLog::record(
            &self.pool,
            NewPrediction {
                model_id: model.id,
                input_data: req.input,
                output_data: Some(&output),
                inference_time_ms: Some(elapsed_ms),
                cached: cache_outcome == CacheOutcome::Hit,
                request_id: req.request_id,
                client_addr: req.client_addr,
            },
        )
        .await?;

        Ok(PredictOutcome {
            prediction,
            cache: cache_outcome,
        })
    }

    pub async fn list_predictions(
        &self,
        model_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Prediction>, i64), AppError> {
        Ok(PredictionLog::list_for_model(&self.pool, model_id, page, page_size).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_outcome_header_values() {
        assert_eq!(CacheOutcome::Hit.as_header_value(), "HIT");
        assert_eq!(CacheOutcome::Miss.as_header_value(), "MISS");
    }
}
