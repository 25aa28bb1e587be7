use std::sync::Arc;

use async_trait::async_trait;
use yardstick_core::context::RunContext;
use yardstick_core::node::NodeInfo;
use yardstick_dispatch::{NodeWorker, WorkError, WorkResult, Worker};
use yardstick_remote::RemoteExecutor;

/// Copies each node's output directory out of its container onto the
/// host.
pub struct DockerCollectWorker {
    ctx: Arc<RunContext>,
    remote: Arc<dyn RemoteExecutor>,
}

impl DockerCollectWorker {
    pub fn new(ctx: Arc<RunContext>, remote: Arc<dyn RemoteExecutor>) -> Self {
        Self { ctx, remote }
    }
}

impl Worker for DockerCollectWorker {
    fn name(&self) -> &str {
        "DockerCollectWorker"
    }
}

#[async_trait]
impl NodeWorker for DockerCollectWorker {
    async fn do_work(&self, node: &NodeInfo) -> Result<WorkResult, WorkError> {
        let work_dir = &self.ctx.remote_work_dir;
        let container = node.container_name();

        tracing::info!(
            container = %container,
            host = %node.host,
            "Collecting data from the container",
        );

        if let Err(e) = self
            .remote
            .run_cmd(&node.host, &format!("mkdir -p {work_dir}/output"))
            .await
        {
            return super::remote_failure(self.name(), e);
        }

        let cp = format!("cp {container}:{work_dir}/output {work_dir}");
        match self.remote.run_docker_cmd(&node.host, &cp).await {
            Ok(_) => Ok(WorkResult::Empty),
            Err(e) => super::remote_failure(self.name(), e),
        }
    }
}
