//! Error hierarchy: every component raises a typed, closed error enum; this
//! module is the single place those converge into an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors raised by the artifact store (C1).
#[derive(Debug)]
pub enum StorageError {
    /// The stream exceeded the configured size cap before finishing.
    Full { max_bytes: u64 },
    /// The requested blob does not exist.
    NotFound(String),
    /// The path, once canonicalized, escapes the configured storage base.
    PathTraversal(String),
    /// Any other I/O failure.
    Other(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full { max_bytes } => write!(f, "artifact exceeds maximum size of {max_bytes} bytes"),
            Self::NotFound(p) => write!(f, "artifact not found: {p}"),
            Self::PathTraversal(p) => write!(f, "resolved path escapes storage base: {p}"),
            Self::Other(m) => write!(f, "storage error: {m}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Errors raised by the inference engine adapter (C2).
#[derive(Debug)]
pub enum EngineError {
    /// The file could not be loaded/parsed as a valid ONNX graph.
    Load(String),
    /// Validation of the graph's schema failed.
    Validation(String),
    /// A required input tensor was missing, or an unexpected shape/dtype was given.
    Input(String),
    /// The runtime itself raised an error while executing the graph.
    Runtime(String),
    /// A committed model's cached session pointed at a file that no longer exists.
    /// This is a hard invariant violation, not a retryable error.
    InvariantViolation(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(m) => write!(f, "failed to load model: {m}"),
            Self::Validation(m) => write!(f, "model validation failed: {m}"),
            Self::Input(m) => write!(f, "invalid inference input: {m}"),
            Self::Runtime(m) => write!(f, "inference runtime error: {m}"),
            Self::InvariantViolation(m) => write!(f, "post-commitment invariant violated: {m}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Whether this is an engine-originated failure that must never be retried
    /// by the job engine (§4.6 step 4 of the expanded specification).
    pub fn is_permanent(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

/// Errors raised by the model catalog (C4).
#[derive(Debug)]
pub enum CatalogError {
    NotFound(String),
    /// `(name, version)` already exists, or the artifact/model is already in
    /// a state that forbids the requested transition.
    Conflict(String),
    /// The requested operation is not valid from the model's current state,
    /// but for reasons short of an identity conflict (e.g. missing artifact).
    BadState(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(m) => write!(f, "{m}"),
            Self::Conflict(m) => write!(f, "{m}"),
            Self::BadState(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Errors raised by the job engine (C6).
#[derive(Debug)]
pub enum JobError {
    NotFound(String),
    /// The job is not in a state that permits the requested operation
    /// (cancel a terminal job, delete a non-terminal job).
    InvalidState(String),
    /// `wait` was outside the server-enforced bound.
    InvalidWait(String),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(m) => write!(f, "{m}"),
            Self::InvalidState(m) => write!(f, "{m}"),
            Self::InvalidWait(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for JobError {}

/// The single HTTP-facing error type. Every component error converges here
/// via `From`; only this type implements `IntoResponse`. No component other
/// than the HTTP surface is permitted to know about status codes.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnprocessableEntity(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::Conflict(m)
            | Self::PayloadTooLarge(m)
            | Self::UnprocessableEntity(m)
            | Self::Internal(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            Self::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.clone()),
            Self::UnprocessableEntity(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
            Self::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(m) => Self::NotFound(m),
            CatalogError::Conflict(m) => Self::Conflict(m),
            CatalogError::BadState(m) => Self::BadRequest(m),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Full { .. } => Self::PayloadTooLarge(e.to_string()),
            StorageError::NotFound(_) => Self::NotFound(e.to_string()),
            StorageError::PathTraversal(_) | StorageError::Other(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match &e {
            EngineError::Input(_) => Self::BadRequest(e.to_string()),
            EngineError::Validation(_) => Self::BadRequest(e.to_string()),
            EngineError::Load(_) | EngineError::Runtime(_) | EngineError::InvariantViolation(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<JobError> for AppError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::NotFound(m) => Self::NotFound(m),
            JobError::InvalidState(m) => Self::BadRequest(m),
            JobError::InvalidWait(m) => Self::UnprocessableEntity(m),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound("record not found".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_invariant_violation_is_not_permanent() {
        let e = EngineError::InvariantViolation("file gone".into());
        assert!(!e.is_permanent());
        let e = EngineError::Runtime("boom".into());
        assert!(e.is_permanent());
    }

    #[test]
    fn catalog_conflict_maps_to_409() {
        let app_err: AppError = CatalogError::Conflict("dup".into()).into();
        assert!(matches!(app_err, AppError::Conflict(_)));
    }

    #[test]
    fn storage_full_maps_to_413() {
        let app_err: AppError = StorageError::Full { max_bytes: 10 }.into();
        assert!(matches!(app_err, AppError::PayloadTooLarge(_)));
    }
}
