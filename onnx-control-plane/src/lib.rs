//! ONNX model-serving control plane: a catalog of versioned ONNX models
//! gated by a commitment state machine, a synchronous prediction path with
//! an optional result cache, and a durable async job engine for long-running
//! inference requests.

pub mod catalog;
pub mod config;
pub mod controllers;
pub mod engine;
pub mod error;
pub mod health;
pub mod jobs;
pub mod orchestrator;
pub mod predictions;
pub mod redis_cache;
pub mod result_cache;
pub mod semver;
pub mod storage;

use std::sync::Arc;

use r2e_core::BeanState;
use r2e_macros::BeanState;
use r2e_data_sqlx::HasPool;
use sqlx::{PgPool, Postgres};

use crate::config::AppConfig;
use crate::engine::InferenceEngine;
use crate::health::CeleryHealthState;
use crate::jobs::JobEngine;
use crate::orchestrator::PredictionOrchestrator;
use crate::result_cache::{ModelCache, ResultCache};
use crate::storage::ArtifactStore;

/// The application state injected into every controller. Assembled once at
/// startup (§4.10) from dependencies that are themselves built outside the
/// bean graph (pool connection, broker connection) because their
/// construction is fallible and the process should refuse to start rather
/// than serve traffic against a half-built dependency.
#[derive(Clone, BeanState)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: PgPool,
    pub storage: ArtifactStore,
    pub engine: Arc<InferenceEngine>,
    pub result_cache: Arc<ResultCache>,
    pub model_cache: Arc<ModelCache>,
    pub orchestrator: PredictionOrchestrator,
    pub job_engine: JobEngine,
    pub celery_health: CeleryHealthState,
}

impl HasPool<Postgres> for AppState {
    fn pool(&self) -> &PgPool {
        &self.pool
    }
}
