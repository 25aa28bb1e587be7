use std::sync::Arc;

use async_trait::async_trait;
use yardstick_core::context::RunContext;
use yardstick_core::node::NodeType;
use yardstick_dispatch::{HostWorker, WorkError, WorkResult, Worker};
use yardstick_remote::RemoteExecutor;

/// Builds the image for one node type on each host.
///
/// Hosts that already have the image are left alone.
pub struct DockerBuildImagesWorker {
    ctx: Arc<RunContext>,
    remote: Arc<dyn RemoteExecutor>,
    node_type: NodeType,
}

impl DockerBuildImagesWorker {
    pub fn new(ctx: Arc<RunContext>, remote: Arc<dyn RemoteExecutor>, node_type: NodeType) -> Self {
        Self {
            ctx,
            remote,
            node_type,
        }
    }

    fn build_cmd(&self) -> String {
        let work_dir = &self.ctx.remote_work_dir;
        format!(
            "build -t {image} -f {work_dir}/config/docker/Dockerfile-{node_type} {work_dir}",
            image = self.ctx.docker.image_name(self.node_type),
            node_type = self.node_type,
        )
    }
}

impl Worker for DockerBuildImagesWorker {
    fn name(&self) -> &str {
        "DockerBuildImagesWorker"
    }
}

#[async_trait]
impl HostWorker for DockerBuildImagesWorker {
    async fn do_work(&self, host: &str, _index: usize) -> Result<WorkResult, WorkError> {
        let image = self.ctx.docker.image_name(self.node_type);

        match self
            .remote
            .run_docker_cmd(host, &format!("images -q {image}"))
            .await
        {
            Ok(out) if out.lines().next().is_some() => {
                tracing::info!(host, image, "Image already exists, skipping build");
                return Ok(WorkResult::Empty);
            }
            Ok(_) => {}
            Err(e) => return super::remote_failure(self.name(), e),
        }

        tracing::info!(host, image, node_type = %self.node_type, "Building docker image");

        match self.remote.run_docker_cmd(host, &self.build_cmd()).await {
            Ok(out) => {
                tracing::info!(host, image, duration_ms = out.duration_ms, "Image built");
                Ok(WorkResult::Empty)
            }
            Err(e) => super::remote_failure(self.name(), e),
        }
    }
}
