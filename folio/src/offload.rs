//! Background execution of store writes.
//!
//! Store writes are fire-and-forget: the response goes back to the caller
//! before the write is guaranteed to finish. [`OffloadManager`] spawns each
//! write as a tokio task and keeps its handle so the host (and tests) can
//! wait until every pending write has settled.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, debug_span, warn};

#[derive(Debug)]
struct OffloadTask {
    kind: SmolStr,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct OffloadManagerInner {
    tasks: DashMap<u64, OffloadTask>,
    key_counter: AtomicU64,
}

/// Manager for offloading tasks to background execution.
///
/// Clones share the same task set.
#[derive(Clone, Debug, Default)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` in the background and returns its id.
    ///
    /// The kind is recorded on the task span. The task runs as a child of the
    /// caller's current span, so its logs keep the request context.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> u64
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cleanup_finished();

        let kind = kind.into();
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        let span = debug_span!("offload_task", kind = %kind, id);
        let handle = tokio::spawn(task.instrument(span));
        self.inner.tasks.insert(id, OffloadTask { kind, handle });
        id
    }

    /// Number of tasks that have not finished yet.
    pub fn active_task_count(&self) -> usize {
        self.inner
            .tasks
            .iter()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Drops handles of finished tasks.
    pub fn cleanup_finished(&self) {
        self.inner
            .tasks
            .retain(|_, task| !task.handle.is_finished());
    }

    /// Aborts every tracked task.
    pub fn cancel_all(&self) {
        for task in self.inner.tasks.iter() {
            task.handle.abort();
        }
    }

    /// Waits until every tracked task, including ones spawned while waiting,
    /// has completed.
    pub async fn wait_idle(&self) {
        loop {
            let ids = self
                .inner
                .tasks
                .iter()
                .map(|task| *task.key())
                .collect::<Vec<_>>();
            if ids.is_empty() {
                break;
            }
            for id in ids {
                let Some((_, task)) = self.inner.tasks.remove(&id) else {
                    continue;
                };
                match task.handle.await {
                    Ok(()) => debug!(kind = %task.kind, id, "offload task settled"),
                    Err(err) if err.is_cancelled() => {
                        debug!(kind = %task.kind, id, "offload task cancelled")
                    }
                    Err(err) => warn!(kind = %task.kind, id, error = %err, "offload task panicked"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn wait_idle_awaits_every_task() {
        let manager = OffloadManager::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let done = done.clone();
            manager.spawn("store", async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.wait_idle().await;

        assert_eq!(done.load(Ordering::SeqCst), 8);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn wait_idle_on_empty_manager_returns() {
        OffloadManager::new().wait_idle().await;
    }

    #[tokio::test]
    async fn clones_share_tasks() {
        let manager = OffloadManager::new();
        let clone = manager.clone();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        clone.spawn("store", async move {
            let _ = rx.await;
        });
        assert_eq!(manager.active_task_count(), 1);

        let _ = tx.send(());
        manager.wait_idle().await;
        assert_eq!(clone.active_task_count(), 0);
    }
}
