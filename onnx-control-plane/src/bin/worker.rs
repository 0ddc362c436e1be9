//! Inference worker (C6 execution side). Consumes `JobTask` deliveries from
//! the broker and drives each one through [`JobEngine::execute`]; this
//! process owns no HTTP surface at all.
//!
//! Retry policy lives here, not in the engine: the engine always leaves a
//! job in a definite state (RUNNING, a terminal state, or an `Err` the
//! caller must settle), and only the loop that holds the retry budget and
//! backoff policy can decide whether "transient" means "try again" or
//! "give up" (§4.6 step 5).

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use uuid::Uuid;

use onnx_control_plane::config::AppConfig;
use onnx_control_plane::engine::InferenceEngine;
use onnx_control_plane::jobs::{backoff_with_jitter, JobEngine, JobEngineExecuteError, JobStore, JobTask, INFERENCE_QUEUE};
use onnx_control_plane::storage::ArtifactStore;

use r2e_core::config::R2eConfig;
use r2e_events_rabbitmq::RabbitMqBus;
use r2e_executor::TaskPool;

const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

const RETRY_BASE: Duration = Duration::from_millis(200);
const RETRY_CAP: Duration = Duration::from_secs(30);
const BROKER_RECONNECT_CAP: Duration = Duration::from_secs(10);

/// A worker identity that survives process restarts (derived from the host,
/// not a fresh UUID) so [`JobStore::fail_orphaned_running`] can find rows
/// this same worker left `RUNNING` before a crash.
fn worker_id() -> String {
    std::env::var("WORKER_ID")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "onnx-worker".to_string())
}

async fn connect_broker(broker_url: &str) -> Arc<RabbitMqBus> {
    let mut attempt = 0u32;
    loop {
        match RabbitMqBus::connect(broker_url).await {
            Ok(bus) => return Arc::new(bus),
            Err(e) => {
                let wait = backoff_with_jitter(attempt, RETRY_BASE, BROKER_RECONNECT_CAP);
                tracing::warn!(error = %e, attempt, wait_ms = wait.as_millis() as u64, "broker connection failed; retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    r2e_core::init_tracing();

    let r2e_config = R2eConfig::load("production").unwrap_or_else(|_| R2eConfig::empty());
    let app_config = AppConfig::from_config(&r2e_config).expect("invalid application configuration");
    app_config.validate().expect("invalid application configuration");

    let pool = sqlx::PgPool::connect(&app_config.database.url)
        .await
        .expect("failed to connect to postgres");
    let storage = ArtifactStore::new(app_config.storage.model_storage_path.clone());
    let engine = Arc::new(InferenceEngine::new());
    let bus = connect_broker(&app_config.celery.broker_url).await;

    let job_engine = JobEngine::new(
        pool.clone(),
        engine.clone(),
        storage.clone(),
        Some(bus.clone()),
        app_config.job.max_retries as i32,
        Duration::from_secs(app_config.celery.task_time_limit_seconds.max(0) as u64),
    );

    let id = worker_id();
    match job_engine.mark_orphaned_running_failed(&id).await {
        Ok(0) => {}
        Ok(n) => tracing::warn!(count = n, worker_id = %id, "failed orphaned jobs left RUNNING by a previous crash"),
        Err(e) => tracing::error!(error = %e, "failed to sweep orphaned jobs at startup"),
    }

    tracing::info!(worker_id = %id, queue = INFERENCE_QUEUE, "worker starting consume loop");

    let consumer_tag = format!("{id}-{}", Uuid::new_v4());
    let mut deliveries = bus
        .consume::<JobTask>(INFERENCE_QUEUE, &consumer_tag)
        .await
        .expect("failed to start consuming inference queue");

    // Bounded pool of concurrently-running tasks: CELERY_WORKER_CONCURRENCY
    // deliveries may be in flight at once, each settled (ack/nack)
    // independently of the others (§4.6). `spawn` blocks the consume loop
    // until a slot frees up, which is what gives the pool its bound — the
    // loop never races ahead of the broker prefetch.
    let concurrency = app_config.celery.worker_concurrency.max(1) as usize;
    let tasks = TaskPool::new(concurrency);

    loop {
        let delivery = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received; stopping consume loop");
                None
            }
            next = deliveries.next() => next,
        };
        let Some(delivery) = delivery else { break };

        let delivery = match delivery {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "error reading delivery from broker");
                continue;
            }
        };

        let bus = bus.clone();
        let pool = pool.clone();
        let job_engine = job_engine.clone();
        let id = id.clone();
        tasks
            .spawn(async move {
                if bus.is_revoked(&delivery.task_id).await {
                    tracing::info!(task_id = %delivery.task_id, "skipping revoked task");
                    let _ = delivery.ack().await;
                    return;
                }

                let job_id = delivery.payload.job_id;
                match job_engine.execute(job_id, &id).await {
                    Ok(()) => {
                        if let Err(e) = delivery.ack().await {
                            tracing::error!(job_id = %job_id, error = %e, "failed to ack completed job");
                        }
                    }
                    Err(JobEngineExecuteError::NotFound(e)) => {
                        tracing::warn!(job_id = %job_id, error = %e, "job row vanished; nothing to retry");
                        let _ = delivery.ack().await;
                    }
                    Err(JobEngineExecuteError::Transient(msg)) => {
                        handle_transient_failure(&pool, &job_engine, job_id, &msg, delivery).await;
                    }
                }
            })
            .await;
    }

    tracing::info!("consume loop ended; draining in-flight jobs");
    tasks.shutdown(SHUTDOWN_DRAIN_TIMEOUT).await;
}

/// Either bumps the retry counter and requeues with a jittered backoff, or
/// settles the job FAILED once retries are exhausted — always a definite
/// outcome, never a silently dropped delivery.
async fn handle_transient_failure(
    pool: &sqlx::PgPool,
    job_engine: &JobEngine,
    job_id: Uuid,
    message: &str,
    delivery: r2e_events_rabbitmq::Delivery<JobTask>,
) {
    let job = match job_engine.get(job_id).await {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "could not reload job after transient failure");
            let _ = delivery.nack(true).await;
            return;
        }
    };

    if job.retries + 1 >= job.max_retries {
        if let Err(e) = job_engine.settle_retries_exhausted(job_id, message).await {
            tracing::error!(job_id = %job_id, error = %e, "failed to settle exhausted job");
        }
        let _ = delivery.ack().await;
        return;
    }

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to open transaction for retry");
            let _ = delivery.nack(true).await;
            return;
        }
    };
    if let Err(e) = JobStore::increment_retry(&mut tx, job_id).await {
        tracing::error!(job_id = %job_id, error = %e, "failed to increment retry count");
        let _ = delivery.nack(true).await;
        return;
    }
    if let Err(e) = tx.commit().await {
        tracing::error!(job_id = %job_id, error = %e, "failed to commit retry count update");
        let _ = delivery.nack(true).await;
        return;
    }

    let wait = backoff_with_jitter(job.retries as u32, RETRY_BASE, RETRY_CAP);
    tracing::warn!(job_id = %job_id, attempt = job.retries + 1, wait_ms = wait.as_millis() as u64, error = message, "retrying job after transient failure");
    tokio::time::sleep(wait).await;
    let _ = delivery.nack(true).await;
}
