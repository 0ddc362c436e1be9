//! End-to-end HTTP surface tests (§4.14, §8 scenarios 2/3/5 and the failure
//! rows of the §6 status-code table). Each test assembles a fresh `AppState`
//! against a disposable `sqlx::test` database and drives it in-process via
//! `r2e_test::TestApp`, the same client the framework's own controller tests
//! use.
//!
//! Scenarios 1, 4, and 6 require an actual committed ONNX graph on disk to
//! exercise the real runtime; those paths are covered at the unit level in
//! `engine.rs`/`orchestrator.rs` instead. Here, a "committed" model is seeded
//! directly into the catalog table (bypassing `/upload` and `/validate`) so
//! that the catalog, job, and cache surfaces can be exercised without a real
//! `ort::Session`. `predict_against_missing_artifact_returns_500` seeds such a
//! model with a blob path that does not exist on disk, which is exactly the
//! shape of scenario 6 (a committed model whose artifact vanished).

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use r2e::prelude::*;
use r2e_cache::InMemoryStore;
use r2e_test::TestApp;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use onnx_control_plane::config::AppConfig;
use onnx_control_plane::controllers::job_controller::JobController;
use onnx_control_plane::controllers::model_controller::ModelController;
use onnx_control_plane::engine::InferenceEngine;
use onnx_control_plane::health::CeleryHealthState;
use onnx_control_plane::jobs::JobEngine;
use onnx_control_plane::orchestrator::PredictionOrchestrator;
use onnx_control_plane::result_cache::{ModelCache, ResultCache};
use onnx_control_plane::storage::ArtifactStore;
use onnx_control_plane::AppState;

/// `DATABASE_URL` is the only field `AppConfig` requires with no default; the
/// `sqlx::test` pool is what actually gets used, this value is never dialed.
/// Every other setting falls back to the same default it would in production.
fn test_config() -> AppConfig {
    // Safety: tests never read this var concurrently with a write to it, and
    // every caller sets it to the same value.
    unsafe { std::env::set_var("DATABASE_URL", "postgres://unused/unused") };
    AppConfig::from_config(&R2eConfig::empty()).expect("test config must satisfy AppConfig")
}

async fn build_app(pool: PgPool, storage_dir: &tempfile::TempDir) -> TestApp {
    let app_config = test_config();
    let storage = ArtifactStore::new(storage_dir.path());
    storage.ensure_base_dir().await.expect("create storage dir");
    let engine = Arc::new(InferenceEngine::new());
    let cache_store = Arc::new(InMemoryStore::new());
    let result_cache = Arc::new(ResultCache::new(cache_store.clone(), "test", Duration::from_secs(60), true));
    let model_cache = Arc::new(ModelCache::new(cache_store, "test", Duration::from_secs(60)));
    let orchestrator = PredictionOrchestrator::new(pool.clone(), engine.clone(), storage.clone(), result_cache.clone());
    let job_engine = JobEngine::new(pool.clone(), engine.clone(), storage.clone(), None, 3, Duration::from_secs(300));
    let celery_health = CeleryHealthState::new(None);

    let builder = AppBuilder::new()
        .provide(app_config)
        .provide(pool)
        .provide(storage)
        .provide(engine)
        .provide(result_cache)
        .provide(model_cache)
        .provide(orchestrator)
        .provide(job_engine)
        .provide(celery_health)
        .build_state::<AppState, _>()
        .await
        .register_controller::<ModelController>()
        .register_controller::<JobController>();

    TestApp::from_builder(builder)
}

/// Inserts a model directly in the `READY` state, bypassing `/upload` and
/// `/validate` — those two handlers are exercised separately below, but most
/// tests here only need a model that has already crossed the commitment
/// boundary. `blob_path` need not point at a real file unless the test
/// actually calls `/predict`.
async fn seed_ready_model(pool: &PgPool, name: &str, version: &str, blob_path: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO models
            (id, name, version, state, blob_path, size_bytes, content_hash, input_schema, output_schema, created_at, updated_at)
        VALUES ($1, $2, $3, 'READY', $4, 128, 'deadbeef', '[]'::jsonb, '[]'::jsonb, now(), now())
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(version)
    .bind(blob_path)
    .execute(pool)
    .await
    .expect("seed ready model");
    id
}

#[sqlx::test(migrations = "./migrations")]
async fn create_model_returns_201(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool, &dir).await;

    let resp = app
        .post_json("/api/v1/models/", &json!({"name": "m", "version": "1.0.0"}))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["name"], "m");
    assert_eq!(body["state"], "PENDING");
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_name_version_conflicts(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool, &dir).await;

    app.post_json("/api/v1/models/", &json!({"name": "dup", "version": "1.0.0"})).await;
    let resp = app.post_json("/api/v1/models/", &json!({"name": "dup", "version": "1.0.0"})).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn get_unknown_model_is_404(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool, &dir).await;

    let resp = app.get(&format!("/api/v1/models/{}", Uuid::new_v4())).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn get_model_reports_cache_hit_on_second_fetch(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;
    let id = seed_ready_model(&pool, "cached", "1.0.0", "cached.onnx").await;

    let first = app.get(&format!("/api/v1/models/{id}")).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers.get("x-cache").unwrap().to_str().unwrap(), "MISS");

    let second = app.get(&format!("/api/v1/models/{id}")).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.headers.get("x-cache").unwrap().to_str().unwrap(), "HIT");
}

/// Scenario 2: commitment rejection. Upload without validating, then attempt
/// to predict — expect 400 naming the uncommitted state.
#[sqlx::test(migrations = "./migrations")]
async fn predict_before_validate_is_rejected(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;

    let created = app.post_json("/api/v1/models/", &json!({"name": "uncommitted", "version": "1.0.0"})).await;
    let model: serde_json::Value = created.json();
    let id = model["id"].as_str().unwrap();

    // Fast-forward straight to UPLOADED without going through multipart —
    // the commitment boundary is enforced by `assert_committed`, not by
    // whether an upload happened through this exact HTTP call.
    sqlx::query("UPDATE models SET state = 'UPLOADED', blob_path = 'x.onnx', content_hash = 'h', size_bytes = 1 WHERE id = $1::uuid")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let resp = app.post_json(&format!("/api/v1/models/{id}/predict"), &json!({"input_data": {}})).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    let message = body["error"].as_str().unwrap_or_default().to_ascii_lowercase();
    assert!(message.contains("uploaded") || message.contains("ready"), "unexpected message: {message}");
}

/// Scenario 3: semver ordering.
#[sqlx::test(migrations = "./migrations")]
async fn versions_sort_newest_first_and_latest_picks_top(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;

    for version in ["1.0.0", "1.10.0", "1.9.0", "2.0.0", "1.0.0-beta"] {
        app.post_json("/api/v1/models/", &json!({"name": "semver-model", "version": version})).await;
    }

    let resp = app.get("/api/v1/models/by-name/semver-model/versions").await;
    assert_eq!(resp.status, StatusCode::OK);
    let versions: Vec<serde_json::Value> = resp.json();
    let ordered: Vec<&str> = versions.iter().map(|v| v["version"].as_str().unwrap()).collect();
    assert_eq!(ordered, vec!["2.0.0", "1.10.0", "1.9.0", "1.0.0", "1.0.0-beta"]);

    let latest = app.get("/api/v1/models/by-name/semver-model/latest").await;
    assert_eq!(latest.status, StatusCode::OK);
    let latest_body: serde_json::Value = latest.json();
    assert_eq!(latest_body["version"], "2.0.0");

    // Only 1.0.0 is committed; ready_only=true must fall back to it.
    sqlx::query("UPDATE models SET state = 'READY', blob_path = 'x.onnx', content_hash = 'h', size_bytes = 1, input_schema = '[]', output_schema = '[]' WHERE name = 'semver-model' AND version = '1.0.0'")
        .execute(&pool)
        .await
        .unwrap();
    let ready_latest = app.get("/api/v1/models/by-name/semver-model/latest?ready_only=true").await;
    assert_eq!(ready_latest.status, StatusCode::OK);
    let ready_body: serde_json::Value = ready_latest.json();
    assert_eq!(ready_body["version"], "1.0.0");
}

#[sqlx::test(migrations = "./migrations")]
async fn upload_rejects_non_onnx_extension(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO models (id, name, version, state, created_at, updated_at) VALUES ($1, 'upload-test', '1.0.0', 'PENDING', now(), now())")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let boundary = "X-BOUNDARY-X";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"model.txt\"\r\nContent-Type: text/plain\r\n\r\nnot an onnx file\r\n--{boundary}--\r\n"
    );
    let req = http::Request::builder()
        .method(http::Method::POST)
        .uri(format!("/api/v1/models/{id}/upload"))
        .header(http::header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(r2e_core::http::body::Body::from(body))
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

/// Scenario 6 analogue: a committed model whose artifact no longer resolves
/// to a loadable file must surface as a 500, not a crash, and must not
/// disturb other committed models.
#[sqlx::test(migrations = "./migrations")]
async fn predict_against_missing_artifact_returns_500(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;
    let id = seed_ready_model(&pool, "vanished", "1.0.0", "vanished.onnx").await;

    let resp = app.post_json(&format!("/api/v1/models/{id}/predict"), &json!({"input_data": {"input": [1.0]}})).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
}

/// Job creation rejects an uncommitted model exactly like the sync path,
/// without a broker (bus = None) left PENDING, and the whole lifecycle is
/// drivable without ever touching the engine.
#[sqlx::test(migrations = "./migrations")]
async fn job_submit_rejects_uncommitted_model(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;
    let created = app.post_json("/api/v1/models/", &json!({"name": "pending-job", "version": "1.0.0"})).await;
    let model: serde_json::Value = created.json();
    let model_id = model["id"].as_str().unwrap();

    let resp = app
        .post_json("/api/v1/jobs/", &json!({"model_id": model_id, "input_data": {}}))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn job_lifecycle_submit_cancel_delete(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;
    let model_id = seed_ready_model(&pool, "job-model", "1.0.0", "job-model.onnx").await;

    let submitted = app
        .post_json("/api/v1/jobs/", &json!({"model_id": model_id, "input_data": {"input": [1.0]}}))
        .await;
    assert_eq!(submitted.status, StatusCode::CREATED);
    let job: serde_json::Value = submitted.json();
    assert_eq!(job["state"], "PENDING");
    let job_id = job["id"].as_str().unwrap();

    let cancelled = app.post_json(&format!("/api/v1/jobs/{job_id}/cancel"), &json!({})).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    let cancelled_body: serde_json::Value = cancelled.json();
    assert_eq!(cancelled_body["state"], "CANCELLED");

    let deleted = app.delete_authenticated(&format!("/api/v1/jobs/{job_id}"), "unused").await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app.get(&format!("/api/v1/jobs/{job_id}")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn job_result_wait_out_of_range_is_422(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool.clone(), &dir).await;
    let model_id = seed_ready_model(&pool, "wait-model", "1.0.0", "wait-model.onnx").await;
    let submitted = app
        .post_json("/api/v1/jobs/", &json!({"model_id": model_id, "input_data": {}}))
        .await;
    let job: serde_json::Value = submitted.json();
    let job_id = job["id"].as_str().unwrap();

    let resp = app.get(&format!("/api/v1/jobs/{job_id}/result?wait=99999")).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn model_page_size_is_clamped_to_100(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(pool, &dir).await;

    let resp = app.get("/api/v1/models/?page=1&page_size=500").await;
    assert_eq!(resp.status, StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["page_size"], 100);
}
