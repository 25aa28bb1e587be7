use std::sync::Arc;

use async_trait::async_trait;
use yardstick_core::context::RunContext;
use yardstick_core::node::NodeType;
use yardstick_dispatch::{HostWorker, WorkError, WorkResult, Worker};
use yardstick_remote::RemoteExecutor;

/// Removes yardstick containers of one node type from each host.
pub struct DockerCleanContWorker {
    remote: Arc<dyn RemoteExecutor>,
    node_type: NodeType,
}

impl DockerCleanContWorker {
    pub fn new(remote: Arc<dyn RemoteExecutor>, node_type: NodeType) -> Self {
        Self { remote, node_type }
    }

    fn prefix(&self) -> String {
        format!("YARDSTICK_{}_", self.node_type.as_str().to_ascii_uppercase())
    }
}

impl Worker for DockerCleanContWorker {
    fn name(&self) -> &str {
        "DockerCleanContWorker"
    }
}

#[async_trait]
impl HostWorker for DockerCleanContWorker {
    async fn do_work(&self, host: &str, _index: usize) -> Result<WorkResult, WorkError> {
        let listing = match self
            .remote
            .run_docker_cmd(host, "ps -a --format '{{.Names}}'")
            .await
        {
            Ok(out) => out,
            Err(e) => return super::remote_failure(self.name(), e),
        };

        let prefix = self.prefix();
        let names: Vec<&str> = listing.lines().filter(|n| n.starts_with(&prefix)).collect();

        if names.is_empty() {
            tracing::debug!(host, node_type = %self.node_type, "No containers to remove");
            return Ok(WorkResult::Empty);
        }

        tracing::info!(host, count = names.len(), "Removing containers");

        match self
            .remote
            .run_docker_cmd(host, &format!("rm -f {}", names.join(" ")))
            .await
        {
            Ok(_) => Ok(WorkResult::Empty),
            Err(e) => super::remote_failure(self.name(), e),
        }
    }
}

/// Removes the image of one node type from each host.
pub struct DockerCleanImagesWorker {
    ctx: Arc<RunContext>,
    remote: Arc<dyn RemoteExecutor>,
    node_type: NodeType,
}

impl DockerCleanImagesWorker {
    pub fn new(ctx: Arc<RunContext>, remote: Arc<dyn RemoteExecutor>, node_type: NodeType) -> Self {
        Self {
            ctx,
            remote,
            node_type,
        }
    }
}

impl Worker for DockerCleanImagesWorker {
    fn name(&self) -> &str {
        "DockerCleanImagesWorker"
    }
}

#[async_trait]
impl HostWorker for DockerCleanImagesWorker {
    async fn do_work(&self, host: &str, _index: usize) -> Result<WorkResult, WorkError> {
        let image = self.ctx.docker.image_name(self.node_type);

        match self
            .remote
            .run_docker_cmd(host, &format!("images -q {image}"))
            .await
        {
            Ok(out) if out.lines().next().is_none() => {
                tracing::debug!(host, image, "Image not present");
                return Ok(WorkResult::Empty);
            }
            Ok(_) => {}
            Err(e) => return super::remote_failure(self.name(), e),
        }

        tracing::info!(host, image, "Removing image");

        match self.remote.run_docker_cmd(host, &format!("rmi -f {image}")).await {
            Ok(_) => Ok(WorkResult::Empty),
            Err(e) => super::remote_failure(self.name(), e),
        }
    }
}
