use std::sync::Arc;

use async_trait::async_trait;
use yardstick_dispatch::{HostWorker, WorkError, WorkResult, Worker};
use yardstick_remote::RemoteExecutor;

/// Verifies the docker daemon answers on every host.
///
/// A host without docker yields a check result with `exit` set, which
/// tells the runner to abort before anything is started.
pub struct DockerCheckWorker {
    remote: Arc<dyn RemoteExecutor>,
}

impl DockerCheckWorker {
    pub fn new(remote: Arc<dyn RemoteExecutor>) -> Self {
        Self { remote }
    }
}

impl Worker for DockerCheckWorker {
    fn name(&self) -> &str {
        "DockerCheckWorker"
    }
}

#[async_trait]
impl HostWorker for DockerCheckWorker {
    async fn do_work(&self, host: &str, _index: usize) -> Result<WorkResult, WorkError> {
        if self.remote.check_docker(host).await {
            tracing::debug!(host, "Docker is available");
            Ok(WorkResult::check(false))
        } else {
            tracing::error!(host, "Docker is not available on the host");
            Ok(WorkResult::check(true))
        }
    }
}
