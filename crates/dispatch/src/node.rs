//! Node-scoped dispatch with optional same-host mutual exclusion.

use std::sync::Arc;

use yardstick_core::node::NodeInfo;

use crate::config::DispatchConfig;
use crate::exclusion::HostLocks;
use crate::pool::WorkerPool;
use crate::result::WorkResult;
use crate::worker::NodeWorker;

/// Fans a [`NodeWorker`] out over logical nodes.
///
/// By default at most one invocation runs per physical host at a time;
/// nodes on different hosts still run concurrently. An interrupted
/// invocation stops the round and cancels the rest (see
/// [`DispatchConfig::for_nodes`]).
#[derive(Debug, Clone)]
pub struct NodeDispatcher {
    config: DispatchConfig,
    run_async_on_host: bool,
}

impl NodeDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            run_async_on_host: false,
        }
    }

    /// Allow nodes sharing a host to run at the same time.
    pub fn run_async_on_host(mut self, run_async_on_host: bool) -> Self {
        self.run_async_on_host = run_async_on_host;
        self
    }

    pub fn is_run_async_on_host(&self) -> bool {
        self.run_async_on_host
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run `worker` once per node and collect what finished in time.
    ///
    /// Results arrive in submission order up to the first interruption,
    /// if any. Never fails.
    pub async fn work_for_nodes<W>(&self, worker: Arc<W>, nodes: &[NodeInfo]) -> Vec<WorkResult>
    where
        W: NodeWorker + ?Sized + 'static,
    {
        worker.before_work();

        let timeout = worker.timeout().unwrap_or(self.config.timeout);
        let locks = HostLocks::for_nodes(nodes);
        let mut pool = WorkerPool::new(worker.name(), self.config.pool_size(), nodes.len());

        for node in nodes {
            let span = tracing::info_span!(
                "node_work",
                worker = %worker.name(),
                host = %node.host,
                node_type = %node.node_type,
                node_id = %node.id
            );
            let token = if self.run_async_on_host {
                None
            } else {
                locks.token(&node.host)
            };
            let worker = Arc::clone(&worker);
            let node = node.clone();

            pool.submit(node.label(), token, span, async move {
                worker.do_work(&node).await
            });
        }

        let results = pool
            .collect(timeout, self.config.cancel_siblings_on_interrupt)
            .await;

        worker.after_work();

        results
    }
}

impl Default for NodeDispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::for_nodes())
    }
}
