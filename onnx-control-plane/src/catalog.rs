//! Model catalog (C4): the durable registry of models and the commitment
//! state machine that gates a model from upload to serveable.
//!
//! ```text
//! PENDING ── upload_ok ──▶ UPLOADED
//! UPLOADED ── validate_begin ──▶ VALIDATING
//! ERROR ── validate_begin ──▶ VALIDATING
//! VALIDATING ── validate_ok ──▶ READY            ← the commitment boundary
//! VALIDATING ── validate_fail ──▶ ERROR
//! any ── archive ──▶ ARCHIVED                    (reserved, not reachable yet)
//! ```
//!
//! All transitions are serialized per-model by `SELECT ... FOR UPDATE` row
//! locking inside a transaction; no other mutual exclusion is used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

use crate::engine::{RuntimeMetadata, TensorSchema};
use crate::error::CatalogError;
use crate::semver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelState {
    Pending,
    Uploaded,
    Validating,
    Ready,
    Error,
    Archived,
}

impl ModelState {
    fn as_db_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Uploaded => "UPLOADED",
            Self::Validating => "VALIDATING",
            Self::Ready => "READY",
            Self::Error => "ERROR",
            Self::Archived => "ARCHIVED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub state: ModelState,
    pub blob_path: Option<String>,
    pub size_bytes: Option<i64>,
    pub content_hash: Option<String>,
    pub input_schema: Option<Json>,
    pub output_schema: Option<Json>,
    pub model_metadata: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Invariant I-M1: a `READY` row must carry its artifact coordinates and
    /// committed schemas. Used by `assert_committed` and as a defensive
    /// double-check wherever a `READY` row is about to be used for inference.
    pub fn is_committed(&self) -> bool {
        self.state == ModelState::Ready
            && self.blob_path.is_some()
            && self.content_hash.is_some()
            && self.input_schema.is_some()
            && self.output_schema.is_some()
    }
}

pub struct ModelCatalog;

impl ModelCatalog {
    /// `create(name, version, description) -> model_id`. Rejects with
    /// `Conflict` if `(name, version)` already exists (P4).
    pub async fn create<'e, E>(
        executor: E,
        name: &str,
        version: &str,
        description: Option<&str>,
    ) -> Result<Model, CatalogError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Model>(
            r#"
            INSERT INTO models (id, name, description, version, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'PENDING', now(), now())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(version)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint().is_some() => {
                CatalogError::Conflict(format!("model '{name}' version '{version}' already exists"))
            }
            other => CatalogError::BadState(other.to_string()),
        })
    }

    pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Model, CatalogError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Model>("SELECT * FROM models WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?
            .ok_or_else(|| CatalogError::NotFound(format!("model {id} not found")))
    }

    /// Locks the row `FOR UPDATE` inside the caller's transaction — used by
    /// every mutating operation to serialize state transitions per-model.
    async fn lock_for_update(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Model, CatalogError> {
        sqlx::query_as::<_, Model>("SELECT * FROM models WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?
            .ok_or_else(|| CatalogError::NotFound(format!("model {id} not found")))
    }

    pub async fn get_by_name_version<'e, E>(
        executor: E,
        name: &str,
        version: &str,
    ) -> Result<Model, CatalogError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Model>("SELECT * FROM models WHERE name = $1 AND version = $2")
            .bind(name)
            .bind(version)
            .fetch_optional(executor)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?
            .ok_or_else(|| CatalogError::NotFound(format!("model '{name}' version '{version}' not found")))
    }

    /// Sorted newest-first per the custom semver comparator (P5).
    pub async fn versions_by_name<'e, E>(executor: E, name: &str) -> Result<Vec<Model>, CatalogError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let mut rows = sqlx::query_as::<_, Model>("SELECT * FROM models WHERE name = $1")
            .bind(name)
            .fetch_all(executor)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?;
        if rows.is_empty() {
            return Err(CatalogError::NotFound(format!("no models named '{name}'")));
        }
        rows.sort_by(|a, b| semver::compare(&a.version, &b.version).reverse());
        Ok(rows)
    }

    pub async fn latest_by_name<'e, E>(
        executor: E,
        name: &str,
        ready_only: bool,
    ) -> Result<Model, CatalogError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let mut rows = sqlx::query_as::<_, Model>("SELECT * FROM models WHERE name = $1")
            .bind(name)
            .fetch_all(executor)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?;
        if ready_only {
            rows.retain(|m| m.state == ModelState::Ready);
        }
        rows.sort_by(|a, b| semver::compare(&a.version, &b.version).reverse());
        rows.into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(format!("no matching model named '{name}'")))
    }

    pub async fn list<'e, E>(executor: E, page: i64, page_size: i64) -> Result<(Vec<Model>, i64), CatalogError>
    where
        E: sqlx::Executor<'e, Database = Postgres> + Copy,
    {
        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM models")
            .fetch_one(executor)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?;
        let offset = (page.max(1) - 1) * page_size;
        let rows = sqlx::query_as::<_, Model>(
            "SELECT * FROM models ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page_size)
        .bind(offset)
        .fetch_all(executor)
        .await
        .map_err(|e| CatalogError::BadState(e.to_string()))?;
        Ok((rows, total))
    }

    pub async fn update_description(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        description: Option<&str>,
    ) -> Result<Model, CatalogError> {
        let _ = Self::lock_for_update(tx, id).await?;
        sqlx::query_as::<_, Model>(
            "UPDATE models SET description = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(description)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| CatalogError::BadState(e.to_string()))
    }

    /// `upload_artifact`: refuses if coordinates are already set (Conflict).
    /// Delegates the blob write to the caller (C1 lives outside the catalog);
    /// this only records the resulting coordinates and advances the state.
    pub async fn begin_upload(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Model, CatalogError> {
        let model = Self::lock_for_update(tx, id).await?;
        if model.blob_path.is_some() {
            return Err(CatalogError::Conflict(format!(
                "model {id} already has an uploaded artifact"
            )));
        }
        if model.state != ModelState::Pending {
            return Err(CatalogError::Conflict(format!(
                "model {id} is in state {:?}, expected PENDING",
                model.state
            )));
        }
        Ok(model)
    }

    pub async fn complete_upload(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        blob_path: &str,
        size_bytes: i64,
        content_hash: &str,
    ) -> Result<Model, CatalogError> {
        sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET blob_path = $2, size_bytes = $3, content_hash = $4,
                state = 'UPLOADED', updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(blob_path)
        .bind(size_bytes)
        .bind(content_hash)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| CatalogError::BadState(e.to_string()))
    }

    /// `commit(model_id)`: the validate operation. Transitions to
    /// `VALIDATING` and returns the locked row + blob path the caller must
    /// pass to the engine adapter; `record_validation_result` finishes the
    /// transition once the engine result is known.
    pub async fn begin_commit(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Model, CatalogError> {
        let model = Self::lock_for_update(tx, id).await?;
        if model.blob_path.is_none() {
            return Err(CatalogError::BadState(format!(
                "model {id} has no uploaded artifact"
            )));
        }
        if !matches!(model.state, ModelState::Uploaded | ModelState::Error) {
            return Err(CatalogError::Conflict(format!(
                "model {id} is in state {:?}, expected UPLOADED or ERROR",
                model.state
            )));
        }
        sqlx::query("UPDATE models SET state = 'VALIDATING', updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?;
        Ok(model)
    }

    pub async fn record_commit_success(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        input_schema: &[TensorSchema],
        output_schema: &[TensorSchema],
        metadata: &RuntimeMetadata,
    ) -> Result<Model, CatalogError> {
        let input_json = serde_json::to_value(input_schema).map_err(|e| CatalogError::BadState(e.to_string()))?;
        let output_json = serde_json::to_value(output_schema).map_err(|e| CatalogError::BadState(e.to_string()))?;
        let meta_json = serde_json::to_value(metadata).map_err(|e| CatalogError::BadState(e.to_string()))?;
        sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET state = 'READY', input_schema = $2, output_schema = $3, model_metadata = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input_json)
        .bind(output_json)
        .bind(meta_json)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| CatalogError::BadState(e.to_string()))
    }

    /// Records the validation failure message into `model_metadata` (merged
    /// with whatever metadata already sits there from a prior attempt) so a
    /// caller inspecting a `ERROR` model can see why it failed (§4.4).
    pub async fn record_commit_failure(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
        error_message: &str,
    ) -> Result<Model, CatalogError> {
        let existing: Option<Json> = sqlx::query_scalar("SELECT model_metadata FROM models WHERE id = $1")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?;
        let mut meta = match existing {
            Some(Json::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        meta.insert("error".to_string(), Json::String(error_message.to_string()));

        sqlx::query_as::<_, Model>(
            "UPDATE models SET state = 'ERROR', model_metadata = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json::Object(meta))
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| CatalogError::BadState(e.to_string()))
    }

    /// `assert_committed`: the single explicit runtime check for
    /// post-commitment invariants. No other code path may infer commitment.
    pub fn assert_committed(model: &Model) -> Result<(), CatalogError> {
        if !model.is_committed() {
            return Err(CatalogError::BadState(format!(
                "model {} has not crossed the commitment boundary (state={:?}, uploaded={})",
                model.id,
                model.state,
                model.blob_path.is_some()
            )));
        }
        Ok(())
    }

    pub async fn delete(tx: &mut sqlx::Transaction<'_, Postgres>, id: Uuid) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM models WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| CatalogError::BadState(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}
