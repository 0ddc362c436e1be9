//! `/models` resource family: catalog CRUD, artifact upload, the commitment
//! boundary (`/validate`), version lookups, and the synchronous predict path.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use r2e::multipart::Multipart;
use r2e::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::{Model, ModelCatalog};
use crate::config::AppConfig;
use crate::engine::InferenceEngine;
use crate::error::AppError;
use crate::orchestrator::{PredictRequest, PredictionOrchestrator};
use crate::predictions::Prediction;
use crate::result_cache::{ModelCache, ResultCache};
use crate::storage::ArtifactStore;
use crate::AppState;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Deserialize)]
pub struct CreateModelRequest {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateModelRequest {
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[derive(Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub ready_only: bool,
}

#[derive(Deserialize)]
pub struct PredictQuery {
    #[serde(default)]
    pub skip_cache: bool,
}

#[derive(Serialize)]
pub struct ModelPage {
    pub items: Vec<Model>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Serialize)]
pub struct PredictionPage {
    pub items: Vec<Prediction>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Controller)]
#[controller(path = "/api/v1/models", state = AppState)]
pub struct ModelController {
    #[inject]
    pool: PgPool,
    #[inject]
    storage: ArtifactStore,
    #[inject]
    engine: Arc<InferenceEngine>,
    #[inject]
    result_cache: Arc<ResultCache>,
    #[inject]
    model_cache: Arc<ModelCache>,
    #[inject]
    orchestrator: PredictionOrchestrator,
    #[inject]
    config: AppConfig,
}

#[routes]
impl ModelController {
    /// `create(name, version, description) -> model_id` (§4.4). Conflicts on
    /// a duplicate `(name, version)` pair surface as 409 via `CatalogError`.
    #[post("/")]
    async fn create(&self, Json(body): Json<CreateModelRequest>) -> Result<(StatusCode, Json<Model>), AppError> {
        let model = ModelCatalog::create(&self.pool, &body.name, &body.version, body.description.as_deref()).await?;
        Ok((StatusCode::CREATED, Json(model)))
    }

    #[get("/")]
    async fn list(&self, Query(q): Query<PageQuery>) -> Result<Json<ModelPage>, AppError> {
        let page_size = q.page_size.clamp(1, 100);
        let (items, total) = ModelCatalog::list(&self.pool, q.page, page_size).await?;
        Ok(Json(ModelPage { items, total, page: q.page, page_size }))
    }

    /// Read-through model cache (`CACHE_MODEL_TTL`): a hit skips the database
    /// round-trip entirely and reports `X-Cache: HIT`; a miss fetches from
    /// the catalog, populates the cache, and reports `X-Cache: MISS`. Either
    /// way the caller gets `Cache-Control: max-age=<ttl>` so it knows how
    /// long it may hold onto the response itself.
    #[get("/{id}")]
    async fn get_by_id(&self, Path(id): Path<Uuid>) -> Result<(HeaderMap, Json<Model>), AppError> {
        let key = id.to_string();
        let (model, cache_hit) = match self.model_cache.lookup(&key).await {
            Some(model) => (model, true),
            None => {
                let model = ModelCatalog::get_by_id(&self.pool, id).await?;
                self.model_cache.store(&model).await;
                (model, false)
            }
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-cache",
            (if cache_hit { "HIT" } else { "MISS" }).parse().expect("fixed ASCII literal"),
        );
        headers.insert(
            "cache-control",
            format!("max-age={}", self.model_cache.ttl_seconds())
                .parse()
                .expect("formatted ASCII integer"),
        );
        Ok((headers, Json(model)))
    }

    #[patch("/{id}")]
    async fn update(&self, Path(id): Path<Uuid>, Json(body): Json<UpdateModelRequest>) -> Result<Json<Model>, AppError> {
        let mut tx = self.pool.begin().await?;
        let model = ModelCatalog::update_description(&mut tx, id, body.description.as_deref()).await?;
        tx.commit().await?;
        self.model_cache.invalidate(&id.to_string()).await;
        Ok(Json(model))
    }

    /// Cascades to `predictions`/`jobs` at the database layer (FK
    /// `ON DELETE CASCADE`); the result cache has no foreign key, so it is
    /// invalidated explicitly here.
    #[delete("/{id}")]
    async fn delete(&self, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
        let mut tx = self.pool.begin().await?;
        let existed = ModelCatalog::delete(&mut tx, id).await?;
        tx.commit().await?;
        if !existed {
            return Err(AppError::NotFound(format!("model {id} not found")));
        }
        self.result_cache.invalidate_model(&id.to_string()).await;
        self.model_cache.invalidate(&id.to_string()).await;
        Ok(StatusCode::NO_CONTENT)
    }

    /// Streams the multipart file field straight into the artifact store —
    /// the whole upload is never buffered in memory (§4.1).
    #[post("/{id}/upload")]
    async fn upload(&self, Path(id): Path<Uuid>, mut multipart: Multipart) -> Result<Json<Model>, AppError> {
        let mut tx = self.pool.begin().await?;
        ModelCatalog::begin_upload(&mut tx, id).await?;
        tx.commit().await?;

        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid multipart upload: {e}")))?
            .ok_or_else(|| AppError::BadRequest("upload is missing a file field".to_string()))?;

        let file_name = field.file_name().unwrap_or_default();
        if !file_name.to_ascii_lowercase().ends_with(".onnx") {
            return Err(AppError::BadRequest(format!(
                "uploaded file '{file_name}' must have an .onnx extension"
            )));
        }

        let max_bytes = self.config.max_model_size_bytes();
        let saved = self.storage.save_stream(&id.to_string(), field, max_bytes).await?;

        let model = match self.record_upload(id, &saved).await {
            Ok(model) => model,
            Err(e) => {
                // The blob already landed on disk; without this the artifact
                // store would leak a file no catalog row ever points to.
                if !self.storage.delete(&saved.path).await {
                    tracing::warn!(model_id = %id, path = %saved.path, "failed to clean up orphaned blob after catalog update error");
                }
                return Err(e);
            }
        };
        self.model_cache.invalidate(&id.to_string()).await;
        Ok(Json(model))
    }

    async fn record_upload(&self, id: Uuid, saved: &crate::storage::SavedArtifact) -> Result<Model, AppError> {
        let mut tx = self.pool.begin().await?;
        let model = ModelCatalog::complete_upload(&mut tx, id, &saved.path, saved.size_bytes as i64, &saved.content_hash).await?;
        tx.commit().await?;
        Ok(model)
    }

    /// The commitment boundary: `UPLOADED`/`ERROR` → `VALIDATING` →
    /// `READY`/`ERROR` (§4.2a, §4.4).
    #[post("/{id}/validate")]
    async fn validate(&self, Path(id): Path<Uuid>) -> Result<Json<Model>, AppError> {
        let mut tx = self.pool.begin().await?;
        let model = ModelCatalog::begin_commit(&mut tx, id).await?;
        tx.commit().await?;

        let blob_path = model
            .blob_path
            .as_deref()
            .expect("begin_commit guarantees an uploaded artifact");
        let resolved = self.storage.resolve(blob_path)?;
        let result = self.engine.validate(&resolved).await;

        let mut tx = self.pool.begin().await?;
        let model = if result.valid {
            ModelCatalog::record_commit_success(&mut tx, id, &result.input_schema, &result.output_schema, &result.metadata)
                .await?
        } else {
            let message = result.error_message.as_deref().unwrap_or("validation failed");
            ModelCatalog::record_commit_failure(&mut tx, id, message).await?
        };
        tx.commit().await?;
        self.model_cache.invalidate(&id.to_string()).await;
        Ok(Json(model))
    }

    #[get("/by-name/{name}/versions")]
    async fn versions_by_name(&self, Path(name): Path<String>) -> Result<Json<Vec<Model>>, AppError> {
        Ok(Json(ModelCatalog::versions_by_name(&self.pool, &name).await?))
    }

    #[get("/by-name/{name}/latest")]
    async fn latest_by_name(&self, Path(name): Path<String>, Query(q): Query<LatestQuery>) -> Result<Json<Model>, AppError> {
        Ok(Json(ModelCatalog::latest_by_name(&self.pool, &name, q.ready_only).await?))
    }

    /// Synchronous inference (§4.5). `X-Cache` reports whether the result
    /// cache served the response or the engine ran fresh.
    #[post("/{id}/predict")]
    async fn predict(
        &self,
        Path(id): Path<Uuid>,
        Query(q): Query<PredictQuery>,
        headers: HeaderMap,
        #[raw] ConnectInfo(peer): ConnectInfo<SocketAddr>,
        Json(input): Json<Json>,
    ) -> Result<(StatusCode, HeaderMap, Json<Prediction>), AppError> {
        let request_id = headers.get("x-request-id").and_then(|v| v.to_str().ok());
        // Prefer a proxy-supplied client address when present; this service
        // typically sits behind a load balancer that terminates TLS.
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());
        let client_addr = forwarded.unwrap_or_else(|| peer.to_string());
        let outcome = self
            .orchestrator
            .predict(PredictRequest {
                model_id: id,
                input: &input,
                skip_cache: q.skip_cache,
                request_id,
                client_addr: Some(&client_addr),
            })
            .await?;

        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            "x-cache",
            outcome.cache.as_header_value().parse().expect("header value is a fixed ASCII literal"),
        );
        Ok((StatusCode::CREATED, response_headers, Json(outcome.prediction)))
    }

    #[get("/{id}/predictions")]
    async fn list_predictions(&self, Path(id): Path<Uuid>, Query(q): Query<PageQuery>) -> Result<Json<PredictionPage>, AppError> {
        let page_size = q.page_size.clamp(1, 100);
        let (items, total) = self.orchestrator.list_predictions(id, q.page, page_size).await?;
        Ok(Json(PredictionPage { items, total, page: q.page, page_size }))
    }
}
