//! Prediction audit log — append-only rows written by the orchestrator's
//! Record phase (C5 phase 3). No state machine: every row is written once
//! and never mutated; rows are destroyed only by cascading model deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prediction {
    pub id: Uuid,
    pub model_id: Uuid,
    pub input_data: Json,
    pub output_data: Option<Json>,
    pub inference_time_ms: Option<f64>,
    pub cached: bool,
    pub request_id: Option<String>,
    pub client_addr: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewPrediction<'a> {
    pub model_id: Uuid,
    pub input_data: &'a Json,
    pub output_data: Option<&'a Json>,
    pub inference_time_ms: Option<f64>,
    pub cached: bool,
    pub request_id: Option<&'a str>,
    pub client_addr: Option<&'a str>,
}

pub struct PredictionLog;

impl PredictionLog {
    pub async fn record<'e, E>(executor: E, row: NewPrediction<'_>) -> Result<Prediction, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions
                (id, model_id, input_data, output_data, inference_time_ms, cached, request_id, client_addr, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.model_id)
        .bind(row.input_data)
        .bind(row.output_data)
        .bind(row.inference_time_ms)
        .bind(row.cached)
        .bind(row.request_id)
        .bind(row.client_addr)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_model<'e, E>(
        executor: E,
        model_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Prediction>, i64), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres> + Copy,
    {
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM predictions WHERE model_id = $1")
            .bind(model_id)
            .fetch_one(executor)
            .await?;
        let offset = (page.max(1) - 1) * page_size;
        let rows = sqlx::query_as::<_, Prediction>(
            "SELECT * FROM predictions WHERE model_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(model_id)
        .bind(page_size)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok((rows, total))
    }
}
