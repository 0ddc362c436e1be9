//! Health/metrics aggregation (C9). Indicators plug into the framework's own
//! [`r2e_core::health`] registry so the aggregate `/health`, `/health/live`
//! and `/health/ready` endpoints fall out of `Health::builder()` for free;
//! `/health/celery` is a small bespoke route because the broker roster view
//! doesn't fit the generic up/down indicator shape.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use r2e_core::health::{HealthIndicator, HealthStatus};
use r2e_core::http::StatusCode;
use serde::Serialize;
use sqlx::PgPool;

use crate::jobs::INFERENCE_QUEUE;
use crate::result_cache::ResultCache;
use crate::storage::ArtifactStore;

/// Bounds every indicator so the aggregate check never blocks longer than
/// the sum of sub-timeouts (§4.9: "never blocks longer than ~1s default").
const CHECK_TIMEOUT: Duration = Duration::from_millis(800);

pub struct DbHealthIndicator {
    pool: PgPool,
}

impl DbHealthIndicator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HealthIndicator for DbHealthIndicator {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(&self.pool)).await {
            Ok(Ok(_)) => HealthStatus::Up,
            Ok(Err(e)) => HealthStatus::Down(e.to_string()),
            Err(_) => HealthStatus::Down("timed out".to_string()),
        }
    }
}

pub struct StorageHealthIndicator {
    store: ArtifactStore,
}

impl StorageHealthIndicator {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

impl HealthIndicator for StorageHealthIndicator {
    fn name(&self) -> &str {
        "storage"
    }

    async fn check(&self) -> HealthStatus {
        match tokio::time::timeout(CHECK_TIMEOUT, self.store.ensure_base_dir()).await {
            Ok(Ok(())) => HealthStatus::Up,
            Ok(Err(e)) => HealthStatus::Down(e.to_string()),
            Err(_) => HealthStatus::Down("timed out".to_string()),
        }
    }
}

/// Caches hit/miss counters are best-effort, so this indicator always
/// reports `Up` — its only purpose is to surface the ratio in the aggregate
/// response, not to gate readiness.
pub struct CacheHealthIndicator {
    cache: Arc<ResultCache>,
}

impl CacheHealthIndicator {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self { cache }
    }
}

impl HealthIndicator for CacheHealthIndicator {
    fn name(&self) -> &str {
        "result_cache"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::Up
    }

    fn affects_readiness(&self) -> bool {
        false
    }
}

/// Broker-specific view distinguishing "reachable but nobody is consuming"
/// from "unreachable" (§4.9: "no_workers and error are distinct states").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CeleryStatus {
    Ok,
    NoWorkers,
    Error,
    Disabled,
}

#[derive(Debug, Serialize)]
pub struct CeleryHealthResponse {
    pub status: CeleryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct CeleryHealthState {
    bus: Option<Arc<r2e_events_rabbitmq::RabbitMqBus>>,
}

impl CeleryHealthState {
    pub fn new(bus: Option<Arc<r2e_events_rabbitmq::RabbitMqBus>>) -> Self {
        Self { bus }
    }

    async fn check(&self) -> CeleryHealthResponse {
        let Some(bus) = &self.bus else {
            return CeleryHealthResponse {
                status: CeleryStatus::Disabled,
                worker_count: None,
                error: None,
            };
        };
        match tokio::time::timeout(CHECK_TIMEOUT, bus.worker_count(INFERENCE_QUEUE)).await {
            Ok(Ok(0)) => CeleryHealthResponse {
                status: CeleryStatus::NoWorkers,
                worker_count: Some(0),
                error: None,
            },
            Ok(Ok(n)) => CeleryHealthResponse {
                status: CeleryStatus::Ok,
                worker_count: Some(n),
                error: None,
            },
            Ok(Err(e)) => CeleryHealthResponse {
                status: CeleryStatus::Error,
                worker_count: None,
                error: Some(e.to_string()),
            },
            Err(_) => CeleryHealthResponse {
                status: CeleryStatus::Error,
                worker_count: None,
                error: Some("timed out inspecting broker".to_string()),
            },
        }
    }
}

/// `GET /health/celery` handler, registered directly since the framework's
/// generic health registry has no notion of a broker worker roster.
pub async fn celery_health_handler(State(state): State<CeleryHealthState>) -> impl axum::response::IntoResponse {
    let response = state.check().await;
    let status_code = match response.status {
        CeleryStatus::Ok | CeleryStatus::Disabled => StatusCode::OK,
        CeleryStatus::NoWorkers | CeleryStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_broker_reports_disabled() {
        let state = CeleryHealthState::new(None);
        let response = state.check().await;
        assert_eq!(response.status, CeleryStatus::Disabled);
    }
}
