//! `/jobs` resource family: durable async inference requests (§4.6). Every
//! handler delegates straight to [`JobEngine`]; the row it returns is always
//! already in its post-transition state.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use r2e::prelude::*;

use crate::error::AppError;
use crate::jobs::{Job, JobEngine, JobOutcome, JobState};
use crate::AppState;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Deserialize)]
pub struct SubmitJobRequest {
    pub model_id: Uuid,
    pub input_data: Json,
}

#[derive(Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobState>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[derive(Deserialize)]
pub struct WaitQuery {
    pub wait: Option<i64>,
}

#[derive(Serialize)]
pub struct JobPage {
    pub items: Vec<Job>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Controller)]
#[controller(path = "/api/v1/jobs", state = AppState)]
pub struct JobController {
    #[inject]
    job_engine: JobEngine,
}

#[routes]
impl JobController {
    /// Creation path: rejects an uncommitted model the same way the
    /// synchronous predict path does, then inserts `PENDING` and best-effort
    /// enqueues onto the broker.
    #[post("/")]
    async fn submit(&self, Json(body): Json<SubmitJobRequest>) -> Result<(StatusCode, Json<Job>), AppError> {
        let job = self.job_engine.submit(body.model_id, body.input_data).await?;
        Ok((StatusCode::CREATED, Json(job)))
    }

    #[get("/")]
    async fn list(&self, Query(q): Query<JobListQuery>) -> Result<Json<JobPage>, AppError> {
        let page_size = q.page_size.clamp(1, 100);
        let (items, total) = self.job_engine.list(q.status, q.page, page_size).await?;
        Ok(Json(JobPage { items, total, page: q.page, page_size }))
    }

    #[get("/{id}")]
    async fn get(&self, Path(id): Path<Uuid>) -> Result<Json<Job>, AppError> {
        Ok(Json(self.job_engine.get(id).await?))
    }

    /// DB-polling wait, bounded server-side (§4.6): `200` once the job is
    /// terminal, `202` if `wait` elapses first.
    #[get("/{id}/result")]
    async fn result(&self, Path(id): Path<Uuid>, Query(q): Query<WaitQuery>) -> Result<(StatusCode, Json<Job>), AppError> {
        match self.job_engine.get_result(id, q.wait).await? {
            JobOutcome::Terminal(job) => Ok((StatusCode::OK, Json(job))),
            JobOutcome::StillRunning(job) => Ok((StatusCode::ACCEPTED, Json(job))),
        }
    }

    /// Revocation is attempted but never blocks the transition; the job row
    /// is the source of truth regardless of whether the broker acted on it.
    #[post("/{id}/cancel")]
    async fn cancel(&self, Path(id): Path<Uuid>) -> Result<Json<Job>, AppError> {
        Ok(Json(self.job_engine.cancel(id).await?))
    }

    #[delete("/{id}")]
    async fn delete(&self, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
        self.job_engine.delete(id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
