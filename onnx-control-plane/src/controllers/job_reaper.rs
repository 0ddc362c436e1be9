//! Periodic reaper (C8): a single scheduled sweep deleting terminal job rows
//! past the configured retention window. No HTTP surface of its own, hence
//! no `path` in the controller attribute.

use r2e::prelude::*;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::jobs::JobStore;
use crate::AppState;

#[derive(Controller)]
#[controller(state = AppState)]
pub struct JobReaper {
    #[inject]
    pool: PgPool,
    #[inject]
    config: AppConfig,
}

#[routes]
impl JobReaper {
    #[scheduled(cron = "0 0 3 * * *")]
    async fn reap(&self) {
        let retention = chrono::Duration::days(self.config.job.retention_days);
        match JobStore::reap_terminal(&self.pool, retention).await {
            Ok(deleted) => tracing::info!(deleted, "reaped terminal jobs past retention window"),
            Err(e) => tracing::warn!(error = %e, "job reaper sweep failed"),
        }
    }
}
