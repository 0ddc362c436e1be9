//! Job engine (C6): durable async inference requests. A job row is the
//! single source of truth for state — the broker only ever nudges a worker
//! to look at a row; it never carries the outcome.
//!
//! ```text
//! PENDING ── enqueue_ok ──▶ QUEUED ── worker picks up ──▶ RUNNING
//! RUNNING ── engine success ──▶ COMPLETED
//! RUNNING ── engine failure (permanent) ──▶ FAILED
//! RUNNING ── retries exhausted ──▶ FAILED
//! {PENDING, QUEUED, RUNNING} ── cancel ──▶ CANCELLED
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::catalog::ModelCatalog;
use crate::engine::InferenceEngine;
use crate::error::{AppError, EngineError, JobError};
use crate::storage::ArtifactStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Invariant I-J2: only terminal jobs may be deleted by the external API;
    /// the reaper only deletes terminal jobs.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub model_id: Uuid,
    pub state: JobState,
    pub priority: Priority,
    pub input_data: Json,
    pub output_data: Option<Json>,
    pub worker_task_id: Option<String>,
    pub worker_id: Option<String>,
    pub retries: i32,
    pub max_retries: i32,
    pub error_message: Option<String>,
    pub error_traceback: Option<String>,
    pub inference_time_ms: Option<f64>,
    pub queue_time_ms: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What `GET /jobs/{id}/result` returns to the caller, before the HTTP layer
/// picks a status code (200 vs 202) per the wait semantics of §4.6.
pub enum JobOutcome {
    Terminal(Job),
    StillRunning(Job),
}

pub struct JobStore;

impl JobStore {
    pub async fn create<'e, E>(
        executor: E,
        model_id: Uuid,
        input_data: &Json,
        priority: Priority,
        max_retries: i32,
    ) -> Result<Job, JobError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, model_id, state, priority, input_data, retries, max_retries, created_at)
            VALUES ($1, $2, 'PENDING', $3, $4, 0, $5, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(model_id)
        .bind(priority)
        .bind(input_data)
        .bind(max_retries)
        .fetch_one(executor)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Job, JobError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| JobError::InvalidState(e.to_string()))?
            .ok_or_else(|| JobError::NotFound(format!("job {id} not found")))
    }

    /// Locks the row `FOR UPDATE` inside the caller's transaction — serializes
    /// transitions per-job the same way `ModelCatalog::lock_for_update` does
    /// for models.
    async fn lock_for_update(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Job, JobError> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| JobError::InvalidState(e.to_string()))?
            .ok_or_else(|| JobError::NotFound(format!("job {id} not found")))
    }

    pub async fn list<'e, E>(
        executor: E,
        state: Option<JobState>,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Job>, i64), JobError>
    where
        E: sqlx::Executor<'e, Database = Postgres> + Copy,
    {
        let offset = (page.max(1) - 1) * page_size;
        let (total, rows) = match state {
            Some(state) => {
                let total: i64 = sqlx::query_scalar("SELECT count(*) FROM jobs WHERE state = $1")
                    .bind(state)
                    .fetch_one(executor)
                    .await
                    .map_err(|e| JobError::InvalidState(e.to_string()))?;
                let rows = sqlx::query_as::<_, Job>(
                    "SELECT * FROM jobs WHERE state = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(state)
                .bind(page_size)
                .bind(offset)
                .fetch_all(executor)
                .await
                .map_err(|e| JobError::InvalidState(e.to_string()))?;
                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT count(*) FROM jobs")
                    .fetch_one(executor)
                    .await
                    .map_err(|e| JobError::InvalidState(e.to_string()))?;
                let rows = sqlx::query_as::<_, Job>(
                    "SELECT * FROM jobs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                )
                .bind(page_size)
                .bind(offset)
                .fetch_all(executor)
                .await
                .map_err(|e| JobError::InvalidState(e.to_string()))?;
                (total, rows)
            }
        };
        Ok((rows, total))
    }

    pub async fn mark_queued(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        worker_task_id: &str,
    ) -> Result<Job, JobError> {
        let job = Self::lock_for_update(tx, id).await?;
        if job.state != JobState::Pending {
            return Err(JobError::InvalidState(format!(
                "job {id} is in state {:?}, expected PENDING",
                job.state
            )));
        }
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = 'QUEUED', worker_task_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(worker_task_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    pub async fn mark_running(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        worker_id: &str,
        queue_time_ms: f64,
    ) -> Result<Job, JobError> {
        let job = Self::lock_for_update(tx, id).await?;
        if !matches!(job.state, JobState::Pending | JobState::Queued) {
            return Err(JobError::InvalidState(format!(
                "job {id} is in state {:?}, expected PENDING or QUEUED",
                job.state
            )));
        }
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET state = 'RUNNING', worker_id = $2, queue_time_ms = $3, started_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(worker_id)
        .bind(queue_time_ms)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    pub async fn mark_completed(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        output_data: &Json,
        inference_time_ms: f64,
    ) -> Result<Job, JobError> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET state = 'COMPLETED', output_data = $2, inference_time_ms = $3, completed_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(output_data)
        .bind(inference_time_ms)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    pub async fn mark_failed(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        error_message: &str,
        error_traceback: Option<&str>,
    ) -> Result<Job, JobError> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET state = 'FAILED', error_message = $2, error_traceback = $3, completed_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(error_message)
        .bind(error_traceback)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    /// Cancellation is permitted from any non-terminal state; regardless of
    /// broker revoke outcome, the row is what decides (§5 "Shared state").
    pub async fn mark_cancelled(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Job, JobError> {
        let job = Self::lock_for_update(tx, id).await?;
        if job.state.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "job {id} is already terminal ({:?})",
                job.state
            )));
        }
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET state = 'CANCELLED', completed_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    pub async fn increment_retry(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Job, JobError> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET retries = retries + 1, state = 'QUEUED' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))
    }

    /// Invariant I-J2: only terminal jobs may be deleted via the external API.
    async fn assert_deletable<'e, E>(executor: E, id: Uuid) -> Result<(), JobError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| JobError::InvalidState(e.to_string()))?
            .ok_or_else(|| JobError::NotFound(format!("job {id} not found")))?;
        if !job.state.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "job {id} is in state {:?}; only terminal jobs may be deleted",
                job.state
            )));
        }
        Ok(())
    }

    /// Any `RUNNING` row whose worker died mid-task without settling it —
    /// the crash safety net calls this on worker startup so a restarted
    /// worker never silently abandons an orphaned job (§4.6 step 6).
    pub async fn fail_orphaned_running<'e, E>(executor: E, worker_id: &str) -> Result<u64, JobError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'FAILED', error_message = 'worker crashed or was restarted mid-task', completed_at = now()
            WHERE state = 'RUNNING' AND worker_id = $1
            "#,
        )
        .bind(worker_id)
        .execute(executor)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Periodic reaper (C8): one SQL statement, one transaction, row count
    /// reported by the caller via a structured log line.
    pub async fn reap_terminal<'e, E>(executor: E, retention: chrono::Duration) -> Result<u64, JobError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let cutoff = Utc::now() - retention;
        let result = sqlx::query(
            "DELETE FROM jobs WHERE state IN ('COMPLETED', 'FAILED', 'CANCELLED') AND completed_at < $1",
        )
        .bind(cutoff)
        .execute(executor)
        .await
        .map_err(|e| JobError::InvalidState(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

/// Exponential backoff with full jitter: `random(0, min(cap, base * 2^attempt))`.
/// Used by the worker between a transient failure and the next retry.
pub fn backoff_with_jitter(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exp = base.as_millis().saturating_mul(1u128 << attempt.min(20));
    let capped = exp.min(cap.as_millis());
    let jittered = rand::thread_rng().gen_range(0..=capped.max(1));
    Duration::from_millis(jittered as u64)
}

/// The JSON payload published onto the broker queue — deliberately minimal,
/// because the job row (not the message) is the source of truth.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobTask {
    pub job_id: Uuid,
}

/// Queue name jobs are published to and workers consume from.
pub const INFERENCE_QUEUE: &str = "inference";

/// Owns the dependencies needed to drive a job through its whole lifecycle:
/// creation (API side) and execution (worker side). Mirrors the
/// service-wraps-pool shape `ArticleService` uses for the catalog, just with
/// a broker handle added for durability.
#[derive(Clone)]
pub struct JobEngine {
    pool: PgPool,
    engine: Arc<InferenceEngine>,
    storage: ArtifactStore,
    bus: Option<Arc<r2e_events_rabbitmq::RabbitMqBus>>,
    queue: String,
    default_max_retries: i32,
    max_wait_seconds: i64,
    task_time_limit: Duration,
}

impl JobEngine {
    pub fn new(
        pool: PgPool,
        engine: Arc<InferenceEngine>,
        storage: ArtifactStore,
        bus: Option<Arc<r2e_events_rabbitmq::RabbitMqBus>>,
        default_max_retries: i32,
        task_time_limit: Duration,
    ) -> Self {
        Self {
            pool,
            engine,
            storage,
            bus,
            queue: INFERENCE_QUEUE.to_string(),
            default_max_retries,
            max_wait_seconds: 30,
            task_time_limit,
        }
    }

    /// Creation path (§4.6): reject uncommitted models just as strictly as
    /// the synchronous path, then insert `PENDING` and best-effort enqueue.
    pub async fn submit(&self, model_id: Uuid, input_data: Json) -> Result<Job, AppError> {
        let model = ModelCatalog::get_by_id(&self.pool, model_id).await?;
        ModelCatalog::assert_committed(&model)?;

        let job = JobStore::create(&self.pool, model_id, &input_data, Priority::Normal, self.default_max_retries)
            .await?;

        let Some(bus) = &self.bus else {
            tracing::warn!(job_id = %job.id, "no broker configured; job left PENDING");
            return Ok(job);
        };

        match bus.publish(&self.queue, &job.id.to_string(), &JobTask { job_id: job.id }).await {
            Ok(()) => {
                let mut tx = self.pool.begin().await?;
                let queued = JobStore::mark_queued(&mut tx, job.id, &job.id.to_string()).await?;
                tx.commit().await?;
                Ok(queued)
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "failed to enqueue job; left PENDING for retry sweep");
                Ok(job)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Job, JobError> {
        JobStore::get_by_id(&self.pool, id).await
    }

    pub async fn list(&self, state: Option<JobState>, page: i64, page_size: i64) -> Result<(Vec<Job>, i64), JobError> {
        JobStore::list(&self.pool, state, page, page_size).await
    }

    /// `cancel(job_id)`: revoke is attempted but never blocks the state
    /// transition — the row is the source of truth (§4.6, §5).
    pub async fn cancel(&self, id: Uuid) -> Result<Job, AppError> {
        let job = JobStore::get_by_id(&self.pool, id).await?;
        if let (Some(bus), Some(task_id)) = (&self.bus, job.worker_task_id.as_ref()) {
            if let Err(e) = bus.revoke(task_id).await {
                tracing::warn!(job_id = %id, error = %e, "broker revoke failed; cancelling row regardless");
            }
        }
        let mut tx = self.pool.begin().await?;
        let cancelled = JobStore::mark_cancelled(&mut tx, id).await?;
        tx.commit().await?;
        Ok(cancelled)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        JobStore::assert_deletable(&self.pool, id).await?;
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `get_result(job_id, wait_seconds)`: DB-polling, never broker long
    /// polling, so this works even if the broker is degraded (§4.6).
    pub async fn get_result(&self, id: Uuid, wait_seconds: Option<i64>) -> Result<JobOutcome, AppError> {
        let wait = wait_seconds.unwrap_or(0);
        if wait < 0 || wait > self.max_wait_seconds {
            return Err(JobError::InvalidWait(format!(
                "wait must be between 0 and {} seconds",
                self.max_wait_seconds
            ))
            .into());
        }

        let job = JobStore::get_by_id(&self.pool, id).await?;
        if job.state.is_terminal() {
            return Ok(JobOutcome::Terminal(job));
        }
        if wait == 0 {
            return Ok(JobOutcome::StillRunning(job));
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(wait as u64);
        loop {
            if tokio::time::Instant::now() >= deadline {
                let current = JobStore::get_by_id(&self.pool, id).await?;
                return Ok(if current.state.is_terminal() {
                    JobOutcome::Terminal(current)
                } else {
                    JobOutcome::StillRunning(current)
                });
            }
            tokio::time::sleep(r2e_events_rabbitmq::RabbitMqBus::IDLE_POLL).await;
            let current = JobStore::get_by_id(&self.pool, id).await?;
            if current.state.is_terminal() {
                return Ok(JobOutcome::Terminal(current));
            }
        }
    }

    /// Execution path (worker process, §4.6 steps 1-4). Settling on retryable
    /// failure is the worker loop's responsibility (step 5), since it alone
    /// knows the retry count and backoff policy; this method always leaves
    /// the row in a definite terminal or `RUNNING` state, never partially
    /// updated.
    pub async fn execute(&self, job_id: Uuid, worker_id: &str) -> Result<(), JobEngineExecuteError> {
        let job = JobStore::get_by_id(&self.pool, job_id)
            .await
            .map_err(JobEngineExecuteError::NotFound)?;
        if job.state.is_terminal() {
            return Ok(());
        }

        let queue_time_ms = (Utc::now() - job.created_at).num_milliseconds() as f64;
        {
            let mut tx = self.pool.begin().await.map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
            JobStore::mark_running(&mut tx, job_id, worker_id, queue_time_ms)
                .await
                .map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
            tx.commit().await.map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
        }

        // Redundant with the API-side check, repeated because the DB is the
        // source of truth and may have moved since creation (§4.6 step 3).
        let model = match ModelCatalog::get_by_id(&self.pool, job.model_id).await {
            Ok(m) => m,
            Err(e) => return self.settle_failed(job_id, &e.to_string(), None).await,
        };
        if ModelCatalog::assert_committed(&model).is_err() {
            return self
                .settle_failed(job_id, "model is no longer committed; aborting job", None)
                .await;
        }
        let Some(blob_path) = model.blob_path.as_deref() else {
            return self.settle_failed(job_id, "committed model has no blob_path", None).await;
        };

        let resolved = match self.storage.resolve(blob_path) {
            Ok(p) => p,
            Err(e) => return self.settle_failed(job_id, &e.to_string(), None).await,
        };

        let named_inputs: std::collections::HashMap<String, Json> = match job.input_data.as_object() {
            Some(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            None => return self.settle_failed(job_id, "input_data is not a JSON object", None).await,
        };

        // §4.6: the hard limit aborts the task outright rather than letting
        // a wedged inference run hold the worker slot forever.
        match tokio::time::timeout(self.task_time_limit, self.engine.run(&resolved, &named_inputs)).await {
            Ok(Ok(outcome)) => {
                let output = serde_json::to_value(&outcome.outputs).unwrap_or(Json::Null);
                let mut tx = self.pool.begin().await.map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
                JobStore::mark_completed(&mut tx, job_id, &output, outcome.elapsed_ms)
                    .await
                    .map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
                tx.commit().await.map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
                Ok(())
            }
            Ok(Err(EngineError::InvariantViolation(msg))) => {
                // Not a retryable failure and not an ordinary engine error:
                // the pipeline contract itself was broken. Still settles the
                // job as FAILED rather than leaving it RUNNING.
                self.settle_failed(job_id, &format!("post-commitment invariant violated: {msg}"), None).await
            }
            Ok(Err(e)) if e.is_permanent() => self.settle_failed(job_id, &e.to_string(), None).await,
            Ok(Err(e)) => Err(JobEngineExecuteError::Transient(e.to_string())),
            Err(_elapsed) => {
                self.settle_failed(job_id, "task exceeded CELERY_TASK_TIME_LIMIT", None).await
            }
        }
    }

    async fn settle_failed(&self, job_id: Uuid, message: &str, traceback: Option<&str>) -> Result<(), JobEngineExecuteError> {
        let mut tx = self.pool.begin().await.map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
        JobStore::mark_failed(&mut tx, job_id, message, traceback)
            .await
            .map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
        tx.commit().await.map_err(|e| JobEngineExecuteError::Transient(e.to_string()))?;
        Ok(())
    }

    /// Final settle call for a job whose retries are exhausted — always
    /// FAILED, never left RUNNING (§4.6 step 5).
    pub async fn settle_retries_exhausted(&self, job_id: Uuid, last_error: &str) -> Result<(), JobError> {
        let mut tx = self.pool.begin().await.map_err(|e| JobError::InvalidState(e.to_string()))?;
        JobStore::mark_failed(&mut tx, job_id, &format!("retries exhausted: {last_error}"), None).await?;
        tx.commit().await.map_err(|e| JobError::InvalidState(e.to_string()))?;
        Ok(())
    }

    pub async fn mark_orphaned_running_failed(&self, worker_id: &str) -> Result<u64, JobError> {
        JobStore::fail_orphaned_running(&self.pool, worker_id).await
    }

    pub fn queue_name(&self) -> &str {
        &self.queue
    }
}

/// Distinguishes permanent engine failures (already settled as FAILED by
/// `execute`) from transient ones the worker loop must retry.
#[derive(Debug)]
pub enum JobEngineExecuteError {
    NotFound(JobError),
    Transient(String),
}

impl std::fmt::Display for JobEngineExecuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(e) => write!(f, "{e}"),
            Self::Transient(m) => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_exactly_completed_failed_cancelled() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        let cap = Duration::from_secs(30);
        for attempt in 0..10 {
            let d = backoff_with_jitter(attempt, Duration::from_millis(100), cap);
            assert!(d <= cap);
        }
    }

    #[test]
    fn backoff_grows_with_attempt_on_average() {
        // Not a statistical test — just checks the formula's shape: a large
        // attempt number hits the cap deterministically (jitter upper bound == cap).
        let cap = Duration::from_millis(500);
        let base = Duration::from_millis(100);
        let d = backoff_with_jitter(10, base, cap);
        assert!(d <= cap);
    }
}
