//! Managed, bounded task pool for long-running background work.
//!
//! [`TaskPool`] caps the number of futures running concurrently (via a
//! semaphore) and tracks every spawned task so that [`TaskPool::shutdown`]
//! can wait for in-flight work to finish (or time out) instead of dropping
//! it on the floor. It's the executor half of a durable job engine: the
//! queue/broker decides *what* to run next, `TaskPool` decides *how many*
//! run at once and how the process winds down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A bounded pool of concurrently-running async tasks with graceful shutdown.
///
/// Cloning a `TaskPool` shares the same semaphore, handle list, and
/// cancellation token — clone it into every worker loop rather than
/// constructing a new one per task.
#[derive(Clone)]
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    shutdown: CancellationToken,
}

impl TaskPool {
    /// Create a pool that runs at most `concurrency` tasks at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// A token that is cancelled once [`TaskPool::shutdown`] begins. Long
    /// running tasks should select on this to wind down promptly instead of
    /// relying solely on the join-handle abort path.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn `fut` onto the pool, blocking until a concurrency slot is free.
    ///
    /// Returns immediately after the task is spawned (not after it
    /// completes) once a slot was acquired — callers that need the result
    /// should communicate it out of band (a channel, a DB row update).
    pub async fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("task pool semaphore closed");
        let handle = tokio::spawn(async move {
            fut.await;
            drop(permit);
        });
        self.handles.lock().await.push(handle);
    }

    /// Returns the number of concurrency slots currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Signal shutdown and wait (up to `timeout`) for in-flight tasks to
    /// finish. Tasks still running after the timeout are left detached —
    /// the pool does not forcibly abort them, since an aborted inference
    /// call would leave a job row stuck in `RUNNING` with no one to settle
    /// it; callers relying on this pool pair it with a crash safety net
    /// that settles orphaned rows on the next worker startup instead.
    pub async fn shutdown(&self, timeout: Duration) {
        self.shutdown.cancel();
        let mut handles = self.handles.lock().await;
        let pending: Vec<_> = handles.drain(..).collect();
        drop(handles);

        if pending.is_empty() {
            return;
        }
        info!(count = pending.len(), "waiting for in-flight tasks to finish");
        let join_all = futures_join_all(pending);
        match tokio::time::timeout(timeout, join_all).await {
            Ok(_) => info!("task pool drained cleanly"),
            Err(_) => warn!("task pool shutdown timed out with tasks still running"),
        }
    }
}

async fn futures_join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}
