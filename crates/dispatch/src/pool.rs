//! Per-call worker pool: bounded fan-out and ordered, timeout-aware
//! collection.
//!
//! A [`WorkerPool`] lives for exactly one dispatch call. Every target
//! becomes one spawned task gated by a shared semaphore sized to the
//! pool; the calling task then waits on each handle in submission order.
//! Only the calling task writes to the result collection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::WorkError;
use crate::exclusion;
use crate::result::WorkResult;

type TaskOutput = Result<WorkResult, WorkError>;

struct PoolTask {
    target: String,
    handle: JoinHandle<TaskOutput>,
}

pub(crate) struct WorkerPool {
    worker: String,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    tasks: Vec<PoolTask>,
}

impl WorkerPool {
    pub(crate) fn new(worker: &str, size: usize, capacity: usize) -> Self {
        Self {
            worker: worker.to_string(),
            permits: Arc::new(Semaphore::new(size.max(1))),
            cancel: CancellationToken::new(),
            tasks: Vec::with_capacity(capacity),
        }
    }

    /// Spawn one invocation.
    ///
    /// When `host_token` is set the task holds it for the whole
    /// invocation, before taking a pool slot so that waiting on a busy
    /// host never occupies one.
    pub(crate) fn submit<F>(
        &mut self,
        target: String,
        host_token: Option<Arc<Mutex<()>>>,
        span: tracing::Span,
        work: F,
    ) where
        F: Future<Output = TaskOutput> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();

        let body = async move {
            let _host_guard = exclusion::acquire(host_token).await;
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| WorkError::Cancelled)?;
            work.await
        };

        let handle = tokio::spawn(
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(WorkError::Cancelled),
                    res = body => res,
                }
            }
            .instrument(span),
        );

        self.tasks.push(PoolTask { target, handle });
    }

    /// Wait on every task in submission order, `timeout` per task.
    ///
    /// Failures and timeouts are logged and skipped. With
    /// `cancel_siblings_on_interrupt`, the first interrupted task stops
    /// collection and cancels everything still outstanding.
    pub(crate) async fn collect(
        self,
        timeout: Duration,
        cancel_siblings_on_interrupt: bool,
    ) -> Vec<WorkResult> {
        let Self {
            worker,
            permits,
            cancel,
            tasks,
        } = self;

        let mut results = Vec::with_capacity(tasks.len());
        let mut outstanding = Vec::new();
        let mut pending = tasks.into_iter();

        while let Some(mut task) = pending.next() {
            match tokio::time::timeout(timeout, &mut task.handle).await {
                Ok(Ok(Ok(res))) => results.push(res),
                Ok(Ok(Err(WorkError::Interrupted))) if cancel_siblings_on_interrupt => {
                    cancel.cancel();
                    outstanding.extend(pending.by_ref());

                    tracing::info!(worker = %worker, "{worker} stopped.");
                    tracing::debug!(
                        worker = %worker,
                        target = %task.target,
                        cancelled = outstanding.len(),
                        "Interrupted, cancelling outstanding work",
                    );
                    break;
                }
                Ok(Ok(Err(e))) => {
                    tracing::error!(
                        worker = %worker,
                        target = %task.target,
                        error = %e,
                        "Work failed",
                    );
                }
                Ok(Err(join_err)) => {
                    tracing::error!(
                        worker = %worker,
                        target = %task.target,
                        panicked = join_err.is_panic(),
                        error = %join_err,
                        "Work task aborted",
                    );
                }
                Err(_elapsed) => {
                    tracing::error!(
                        worker = %worker,
                        target = %task.target,
                        timeout_ms = timeout.as_millis() as u64,
                        "Work timed out",
                    );
                    outstanding.push(task);
                }
            }
        }

        // Tear the pool down: nothing outlives the call.
        cancel.cancel();
        permits.close();
        for task in outstanding {
            task.handle.abort();
            let _ = task.handle.await;
        }

        results
    }
}
