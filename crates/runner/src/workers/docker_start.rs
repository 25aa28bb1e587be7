use std::sync::Arc;

use async_trait::async_trait;
use yardstick_core::context::RunContext;
use yardstick_core::node::{NodeInfo, NodeStatus};
use yardstick_dispatch::{NodeWorker, WorkError, WorkResult, Worker};
use yardstick_remote::{RemoteError, RemoteExecutor};

/// Starts one container per node and reports the updated node.
///
/// The returned node carries the container id and, when docker reports
/// it, the pid of the container's main process.
pub struct DockerStartContWorker {
    ctx: Arc<RunContext>,
    remote: Arc<dyn RemoteExecutor>,
}

impl DockerStartContWorker {
    pub fn new(ctx: Arc<RunContext>, remote: Arc<dyn RemoteExecutor>) -> Self {
        Self { ctx, remote }
    }

    fn run_cmd(&self, node: &NodeInfo) -> String {
        let work_dir = &self.ctx.remote_work_dir;
        format!(
            "run -d --network host --name {name} -v {work_dir}:{work_dir} -w {work_dir} {image} {start}",
            name = node.container_name(),
            image = self.ctx.docker.image_name(node.node_type),
            start = self.ctx.start_cmd(node.node_type),
        )
    }

    async fn discover_pid(&self, node: &NodeInfo) -> Option<u32> {
        let cmd = format!("inspect -f '{{{{.State.Pid}}}}' {}", node.container_name());
        match self.remote.run_docker_cmd(&node.host, &cmd).await {
            Ok(out) => out.lines().next().and_then(|l| l.parse().ok()).filter(|pid| *pid > 0),
            Err(e) => {
                tracing::warn!(node = %node.label(), error = %e, "Could not read container pid");
                None
            }
        }
    }
}

impl Worker for DockerStartContWorker {
    fn name(&self) -> &str {
        "DockerStartContWorker"
    }
}

#[async_trait]
impl NodeWorker for DockerStartContWorker {
    async fn do_work(&self, node: &NodeInfo) -> Result<WorkResult, WorkError> {
        tracing::info!(
            container = %node.container_name(),
            host = %node.host,
            "Starting container",
        );

        let mut started = node.clone();

        match self.remote.run_docker_cmd(&node.host, &self.run_cmd(node)).await {
            Ok(out) => {
                started.container_id = out.lines().next().map(|id| id.chars().take(12).collect());
                started.status = NodeStatus::Running;
                started.pid = self.discover_pid(node).await;
                started.description = Some(format!("container {}", node.container_name()));
            }
            Err(RemoteError::Interrupted { .. }) => return Err(WorkError::Interrupted),
            Err(e) => {
                tracing::error!(node = %node.label(), error = %e, "Failed to start container");
                started.status = NodeStatus::Failed;
            }
        }

        Ok(WorkResult::Node(started))
    }
}
