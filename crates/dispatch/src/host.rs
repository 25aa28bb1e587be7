//! Host-scoped dispatch.

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::pool::WorkerPool;
use crate::result::WorkResult;
use crate::worker::HostWorker;

/// Fans a [`HostWorker`] out over a list of host entries.
///
/// Every entry is an independent invocation, duplicates included. A slow
/// or failing host never affects its siblings unless
/// [`DispatchConfig::cancel_siblings_on_interrupt`] is set.
#[derive(Debug, Clone)]
pub struct HostDispatcher {
    config: DispatchConfig,
}

impl HostDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run `worker` once per entry of `hosts` and collect what finished
    /// in time. Never fails; the result may be shorter than `hosts`.
    pub async fn work_on_hosts<W>(&self, worker: Arc<W>, hosts: &[String]) -> Vec<WorkResult>
    where
        W: HostWorker + ?Sized + 'static,
    {
        worker.before_work();

        let timeout = worker.timeout().unwrap_or(self.config.timeout);
        let mut pool = WorkerPool::new(worker.name(), self.config.pool_size(), hosts.len());

        for (index, host) in hosts.iter().enumerate() {
            let span = tracing::info_span!(
                "host_work",
                worker = %worker.name(),
                host = %host,
                index
            );
            let worker = Arc::clone(&worker);
            let target = host.clone();
            let host = host.clone();

            pool.submit(target, None, span, async move {
                worker.do_work(&host, index).await
            });
        }

        let results = pool
            .collect(timeout, self.config.cancel_siblings_on_interrupt)
            .await;

        worker.after_work();

        results
    }
}

impl Default for HostDispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::for_hosts())
    }
}
