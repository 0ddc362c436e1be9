//! HTTP control plane entrypoint (C10). Bootstraps every bean by hand in
//! `setup()` — connecting the pool and the broker is fallible and the
//! process should refuse to start rather than serve traffic against a
//! half-built dependency — then wires the finished values into the bean
//! graph the same way `example-postgres` does for its single pool bean.

use std::sync::Arc;
use std::time::Duration;

use r2e::prelude::*;
use r2e::r2e_cache::InMemoryStore;
use r2e::r2e_observability::{Observability, ObservabilityConfig};
use r2e::r2e_openapi::{OpenApiConfig, OpenApiPlugin};
use r2e::r2e_prometheus::Prometheus;
use r2e::r2e_scheduler::Scheduler;
use r2e_core::health::HealthBuilder;
use r2e_events_rabbitmq::RabbitMqBus;

use onnx_control_plane::config::AppConfig;
use onnx_control_plane::controllers::job_controller::JobController;
use onnx_control_plane::controllers::job_reaper::JobReaper;
use onnx_control_plane::controllers::model_controller::ModelController;
use onnx_control_plane::engine::InferenceEngine;
use onnx_control_plane::health::{celery_health_handler, CacheHealthIndicator, CeleryHealthState, DbHealthIndicator, StorageHealthIndicator};
use onnx_control_plane::jobs::JobEngine;
use onnx_control_plane::orchestrator::PredictionOrchestrator;
use onnx_control_plane::redis_cache::RedisStore;
use onnx_control_plane::result_cache::{ModelCache, ResultCache};
use onnx_control_plane::storage::ArtifactStore;
use onnx_control_plane::AppState;
use r2e_cache::CacheStore;

/// Everything built once at startup, before the bean graph exists. Mirrors
/// the `AppEnv` shape from the dev-reload example, minus the hot-patch
/// plumbing this service doesn't need.
struct AppEnv {
    r2e_config: R2eConfig,
    app_config: AppConfig,
    pool: sqlx::PgPool,
    storage: ArtifactStore,
    engine: Arc<InferenceEngine>,
    result_cache: Arc<ResultCache>,
    model_cache: Arc<ModelCache>,
    orchestrator: PredictionOrchestrator,
    job_engine: JobEngine,
    celery_health: CeleryHealthState,
}

/// Result/model cache backend (§3/§5): Redis when `REDIS_ENABLED` is true,
/// so replica server and worker processes share one cache instead of each
/// keeping its own in-memory copy. Falls back to `InMemoryStore` (and logs
/// plainly that caching won't be visible across processes) whenever Redis
/// is disabled or unreachable — a cache outage must degrade, never crash
/// the control plane (§4.3).
async fn build_cache_store(app_config: &AppConfig) -> Arc<dyn CacheStore> {
    if !app_config.redis.enabled {
        tracing::info!("REDIS_ENABLED=false; result/model cache is process-local and not shared across replicas");
        return Arc::new(InMemoryStore::new());
    }
    match RedisStore::connect(&app_config.redis.url).await {
        Ok(store) => {
            tracing::info!(url = %app_config.redis.url, "connected to redis for cross-process caching");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to connect to redis; falling back to process-local cache");
            Arc::new(InMemoryStore::new())
        }
    }
}

async fn setup() -> AppEnv {
    let r2e_config = R2eConfig::load("production").unwrap_or_else(|_| R2eConfig::empty());
    let app_config = AppConfig::from_config(&r2e_config).expect("invalid application configuration");
    app_config.validate().expect("invalid application configuration");

    let pool = sqlx::PgPool::connect(&app_config.database.url)
        .await
        .expect("failed to connect to postgres");

    let storage = ArtifactStore::new(app_config.storage.model_storage_path.clone());
    storage.ensure_base_dir().await.expect("failed to create model storage directory");

    let engine = Arc::new(InferenceEngine::new());

    let cache_store = build_cache_store(&app_config).await;
    let result_cache = Arc::new(ResultCache::new(
        cache_store.clone(),
        app_config.cache.key_prefix.clone(),
        Duration::from_secs(app_config.cache.prediction_ttl_seconds.max(0) as u64),
        app_config.cache.prediction_enabled,
    ));
    let model_cache = Arc::new(ModelCache::new(
        cache_store,
        app_config.cache.key_prefix.clone(),
        Duration::from_secs(app_config.cache.model_ttl_seconds.max(0) as u64),
    ));

    // The broker is best-effort: a control plane that can't reach RabbitMQ
    // still serves the synchronous predict path, it just can't dispatch
    // async jobs (§4.6 — `submit` degrades to a PENDING row with a warning).
    let bus = match RabbitMqBus::connect(&app_config.celery.broker_url).await {
        Ok(bus) => Some(Arc::new(bus)),
        Err(e) => {
            tracing::warn!(error = %e, "could not connect to rabbitmq broker; jobs will stay PENDING");
            None
        }
    };

    let orchestrator = PredictionOrchestrator::new(pool.clone(), engine.clone(), storage.clone(), result_cache.clone());
    let job_engine = JobEngine::new(
        pool.clone(),
        engine.clone(),
        storage.clone(),
        bus.clone(),
        app_config.job.max_retries as i32,
        Duration::from_secs(app_config.celery.task_time_limit_seconds.max(0) as u64),
    );
    let celery_health = CeleryHealthState::new(bus.clone());

    AppEnv {
        r2e_config,
        app_config,
        pool,
        storage,
        engine,
        result_cache,
        model_cache,
        orchestrator,
        job_engine,
        celery_health,
    }
}

fn cors_layer(app_config: &AppConfig) -> Cors {
    let origins = app_config.cors_origins();
    if origins.iter().any(|o| o == "*") {
        return Cors::permissive();
    }
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
        .collect();
    Cors::custom(
        tower_http::cors::CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}

#[tokio::main]
async fn main() {
    r2e::init_tracing();

    let env = setup().await;
    let cors = cors_layer(&env.app_config);
    let bind_addr = env.app_config.app.bind_addr.clone();
    let service_name = env.app_config.app.name.clone();
    let service_version = env.app_config.app.version.clone();

    AppBuilder::new()
        .plugin(Scheduler)
        .provide(env.app_config)
        .provide(env.pool.clone())
        .provide(env.storage.clone())
        .provide(env.engine.clone())
        .provide(env.result_cache.clone())
        .provide(env.model_cache)
        .provide(env.orchestrator)
        .provide(env.job_engine)
        .provide(env.celery_health)
        .build_state::<AppState, _>()
        .await
        .with_config(env.r2e_config)
        .with(
            HealthBuilder::new()
                .check(DbHealthIndicator::new(env.pool.clone()))
                .check(StorageHealthIndicator::new(env.storage.clone()))
                .check(CacheHealthIndicator::new(env.result_cache.clone()))
                .cache_ttl(Duration::from_secs(5))
                .build(),
        )
        .with(cors)
        .with(Tracing)
        .with(RequestIdPlugin)
        .with(ErrorHandling)
        .with(
            Prometheus::builder()
                .endpoint("/metrics")
                .namespace("onnx_control_plane")
                .exclude_path("/health")
                .exclude_path("/metrics")
                .build(),
        )
        .with(Observability::new(
            ObservabilityConfig::new(service_name)
                .with_service_version(service_version)
                .capture_header("x-request-id"),
        ))
        .with(OpenApiPlugin::new(
            OpenApiConfig::new("ONNX Control Plane API", "0.1.0")
                .with_description("Model catalog, synchronous inference, and async job dispatch for ONNX models")
                .with_docs_ui(true),
        ))
        .on_start(|state| async move {
            sqlx::migrate!("./migrations")
                .run(&state.pool)
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            tracing::info!("database migrations applied");
            Ok(())
        })
        .register_controller::<ModelController>()
        .register_controller::<JobController>()
        .register_controller::<JobReaper>()
        .register_routes(axum::Router::new().route("/health/celery", axum::routing::get(celery_health_handler)))
        .with(NormalizePath)
        .serve(&bind_addr)
        .await
        .unwrap();
}
