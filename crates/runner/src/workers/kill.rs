use std::sync::Arc;

use async_trait::async_trait;
use yardstick_core::node::{NodeInfo, NodeStatus};
use yardstick_dispatch::{HostWorker, NodeWorker, WorkError, WorkResult, Worker};
use yardstick_remote::{RemoteError, RemoteExecutor};

const KILL_SERVERS_CMD: &str = "pkill -9 -f \"Dyardstick.server\"";
const KILL_DRIVERS_CMD: &str = "pkill -9 -f \"Dyardstick.driver\"";

/// Kills every yardstick server and driver process on each host.
pub struct KillWorker {
    remote: Arc<dyn RemoteExecutor>,
}

impl KillWorker {
    pub fn new(remote: Arc<dyn RemoteExecutor>) -> Self {
        Self { remote }
    }

    /// Kill a single node by pid. Returns the node marked stopped, or
    /// unchanged if it has no pid or the kill failed. An interrupted
    /// remote command is surfaced.
    pub async fn kill_node(&self, node: &NodeInfo) -> Result<NodeInfo, WorkError> {
        let Some(pid) = node.pid else {
            return Ok(node.clone());
        };

        match self.remote.run_cmd(&node.host, &format!("kill -9 {pid}")).await {
            Ok(_) => {
                tracing::info!(node = %node.label(), pid, "Killed node");
                Ok(NodeInfo {
                    pid: None,
                    status: NodeStatus::Stopped,
                    ..node.clone()
                })
            }
            Err(RemoteError::Interrupted { .. }) => Err(WorkError::Interrupted),
            Err(e) => {
                tracing::error!(node = %node.label(), pid, error = %e, "Failed to kill node");
                Ok(node.clone())
            }
        }
    }
}

/// Kills individual nodes by pid, one host at a time.
pub struct KillNodeWorker {
    inner: KillWorker,
}

impl KillNodeWorker {
    pub fn new(remote: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            inner: KillWorker::new(remote),
        }
    }
}

impl Worker for KillNodeWorker {
    fn name(&self) -> &str {
        "KillNodeWorker"
    }
}

#[async_trait]
impl NodeWorker for KillNodeWorker {
    async fn do_work(&self, node: &NodeInfo) -> Result<WorkResult, WorkError> {
        self.inner.kill_node(node).await.map(WorkResult::Node)
    }
}

impl Worker for KillWorker {
    fn name(&self) -> &str {
        "KillWorker"
    }
}

#[async_trait]
impl HostWorker for KillWorker {
    async fn do_work(&self, host: &str, _index: usize) -> Result<WorkResult, WorkError> {
        for cmd in [KILL_SERVERS_CMD, KILL_DRIVERS_CMD] {
            match self.remote.run_cmd(host, cmd).await {
                Ok(_) => tracing::debug!(host, cmd, "Killed matching processes"),
                // pkill exits 1 when nothing matched.
                Err(RemoteError::NonZeroExit { exit_code: 1, .. }) => {
                    tracing::debug!(host, cmd, "No matching processes");
                }
                Err(e) => return super::remote_failure(self.name(), e),
            }
        }

        Ok(WorkResult::Empty)
    }
}
