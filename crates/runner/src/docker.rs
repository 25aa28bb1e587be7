//! Docker run mode: sequences the docker workers per node type.
//!
//! Each operation builds a fresh worker and a fresh dispatcher per node
//! type, so nothing is shared between rounds except the run context and
//! the remote executor.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use yardstick_core::context::{CleanStage, RunContext};
use yardstick_core::node::{NodeInfo, NodeStatus, NodeType};
use yardstick_dispatch::{DispatchConfig, HostDispatcher, NodeDispatcher, WorkResult};
use yardstick_remote::RemoteExecutor;

use crate::workers::{
    DockerBuildImagesWorker, DockerCheckWorker, DockerCleanContWorker, DockerCleanImagesWorker,
    DockerCollectWorker, DockerStartContWorker, KillNodeWorker, KillWorker,
};

#[derive(Clone)]
pub struct DockerRunner {
    ctx: Arc<RunContext>,
    remote: Arc<dyn RemoteExecutor>,
}

impl DockerRunner {
    pub fn new(ctx: Arc<RunContext>, remote: Arc<dyn RemoteExecutor>) -> Self {
        Self { ctx, remote }
    }

    fn host_dispatcher(&self) -> HostDispatcher {
        HostDispatcher::new(DispatchConfig::for_hosts().with_context(&self.ctx))
    }

    fn node_dispatcher(&self) -> NodeDispatcher {
        NodeDispatcher::new(DispatchConfig::for_nodes().with_context(&self.ctx))
    }

    /// Check docker on every host of each type.
    ///
    /// Returns `true` when the run should be aborted.
    pub async fn check(&self, node_types: &[NodeType]) -> bool {
        let mut abort = false;

        for &node_type in node_types {
            tracing::info!(node_type = %node_type, "Run mode DOCKER enabled");

            let hosts = self.ctx.unique_hosts_by_type(node_type);
            let results = self
                .host_dispatcher()
                .work_on_hosts(Arc::new(DockerCheckWorker::new(self.remote.clone())), &hosts)
                .await;

            // A host that never answered counts as unusable.
            if results.len() < hosts.len() || results.iter().any(WorkResult::exit) {
                abort = true;
            }
        }

        abort
    }

    /// Build images for every type.
    ///
    /// Types are prepared concurrently only when servers and drivers run
    /// on separate machines.
    pub async fn prepare(&self, node_types: &[NodeType]) {
        let pool_size = if self.ctx.check_if_different_hosts() { 2 } else { 1 };
        self.prepare_on(Arc::new(Semaphore::new(pool_size)), node_types)
            .await;
    }

    async fn prepare_on(&self, permits: Arc<Semaphore>, node_types: &[NodeType]) {
        let mut set = JoinSet::new();

        for &node_type in node_types {
            let runner = self.clone();
            let permits = Arc::clone(&permits);
            let span = tracing::info_span!("prepare", node_type = %node_type);

            set.spawn(
                async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        tracing::error!("Prepare pool closed, skipping image build");
                        return;
                    };
                    runner.prepare_for_node_type(node_type).await;
                }
                .instrument(span),
            );
        }

        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "Failed to prepare docker");
            }
        }
    }

    async fn prepare_for_node_type(&self, node_type: NodeType) {
        let worker = DockerBuildImagesWorker::new(self.ctx.clone(), self.remote.clone(), node_type);
        self.host_dispatcher()
            .work_on_hosts(Arc::new(worker), &self.ctx.unique_hosts_by_type(node_type))
            .await;
    }

    /// Remove containers and/or images as configured for `stage`.
    pub async fn clean_up(&self, node_types: &[NodeType], stage: CleanStage) {
        let docker = &self.ctx.docker;

        for &node_type in node_types {
            let hosts = self.ctx.unique_hosts_by_type(node_type);

            if docker.remove_containers.get(stage) {
                let worker = DockerCleanContWorker::new(self.remote.clone(), node_type);
                self.host_dispatcher()
                    .work_on_hosts(Arc::new(worker), &hosts)
                    .await;
            }

            if docker.remove_images.get(stage) {
                let worker =
                    DockerCleanImagesWorker::new(self.ctx.clone(), self.remote.clone(), node_type);
                self.host_dispatcher()
                    .work_on_hosts(Arc::new(worker), &hosts)
                    .await;
            }
        }
    }

    /// Start one container per node; returns the nodes that came up.
    pub async fn start(&self, node_types: &[NodeType]) -> Vec<NodeInfo> {
        let mut started = Vec::new();

        for &node_type in node_types {
            let worker = DockerStartContWorker::new(self.ctx.clone(), self.remote.clone());
            let results = self
                .node_dispatcher()
                .work_for_nodes(Arc::new(worker), &self.ctx.nodes(node_type))
                .await;

            started.extend(
                results
                    .into_iter()
                    .filter_map(WorkResult::into_node)
                    .filter(|n| n.status == NodeStatus::Running),
            );
        }

        started
    }

    /// Copy benchmark output out of every node's container.
    pub async fn collect(&self, node_types: &[NodeType]) {
        for &node_type in node_types {
            let worker = DockerCollectWorker::new(self.ctx.clone(), self.remote.clone());
            self.node_dispatcher()
                .work_for_nodes(Arc::new(worker), &self.ctx.nodes(node_type))
                .await;
        }
    }

    /// Kill yardstick processes on every host of each type.
    pub async fn kill(&self, node_types: &[NodeType]) {
        for &node_type in node_types {
            self.host_dispatcher()
                .work_on_hosts(
                    Arc::new(KillWorker::new(self.remote.clone())),
                    &self.ctx.unique_hosts_by_type(node_type),
                )
                .await;
        }
    }

    /// Kill previously started nodes by pid; returns the nodes as left
    /// after the attempt.
    pub async fn stop(&self, nodes: &[NodeInfo]) -> Vec<NodeInfo> {
        self.node_dispatcher()
            .work_for_nodes(Arc::new(KillNodeWorker::new(self.remote.clone())), nodes)
            .await
            .into_iter()
            .filter_map(WorkResult::into_node)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::testing::{context, FakeRemote, Reply};

    fn runner(ctx: RunContext, remote: Arc<FakeRemote>) -> DockerRunner {
        DockerRunner::new(Arc::new(ctx), remote)
    }

    #[tokio::test]
    async fn check_passes_when_docker_everywhere() {
        let remote = Arc::new(FakeRemote::default());
        let r = runner(context("s1,s2", "d1"), remote.clone());

        assert!(!r.check(&[NodeType::Server, NodeType::Driver]).await);
        assert_eq!(remote.commands().len(), 3);
    }

    #[tokio::test]
    async fn check_aborts_when_a_host_lacks_docker() {
        let remote = Arc::new(FakeRemote::default().reply("version", Reply::Exit(127)));
        let r = runner(context("s1", "d1"), remote);

        assert!(r.check(&[NodeType::Server]).await);
    }

    #[tokio::test]
    async fn check_uses_unique_hosts() {
        let remote = Arc::new(FakeRemote::default());
        let r = runner(context("s1,s1,s1", ""), remote.clone());

        r.check(&[NodeType::Server]).await;
        assert_eq!(remote.commands().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn prepare_builds_one_image_per_type_and_host() {
        let remote = Arc::new(FakeRemote::default());
        let r = runner(context("s1,s2", "d1"), remote.clone());

        r.prepare(&[NodeType::Server, NodeType::Driver]).await;

        let builds: Vec<String> = remote
            .commands()
            .into_iter()
            .filter(|c| c.starts_with("docker build"))
            .collect();
        assert_eq!(builds.len(), 3);
        assert_eq!(
            builds.iter().filter(|c| c.contains("yardstick-driver")).count(),
            1
        );
    }

    #[tokio::test]
    async fn prepare_skips_builds_when_pool_is_closed() {
        let remote = Arc::new(FakeRemote::default());
        let r = runner(context("s1", "d1"), remote.clone());
        let permits = Arc::new(Semaphore::new(2));
        permits.close();

        r.prepare_on(permits, &[NodeType::Server, NodeType::Driver])
            .await;

        assert!(remote.commands().is_empty());
    }

    #[tokio::test]
    async fn clean_up_honors_stage_flags() {
        let remote = Arc::new(FakeRemote::default().reply(
            "ps -a",
            Reply::Stdout("YARDSTICK_SERVER_0\n".into()),
        ));
        let r = runner(context("s1", ""), remote.clone());

        // Defaults: containers removed before start only; images never.
        r.clean_up(&[NodeType::Server], CleanStage::AfterFinish).await;
        assert!(remote.commands().is_empty());

        r.clean_up(&[NodeType::Server], CleanStage::BeforeStart).await;
        assert_eq!(
            remote.commands(),
            vec!["docker ps -a --format '{{.Names}}'", "docker rm -f YARDSTICK_SERVER_0"]
        );
    }

    #[tokio::test]
    async fn start_returns_running_nodes_only() {
        let remote = Arc::new(
            FakeRemote::default()
                .reply("YARDSTICK_SERVER_1 ", Reply::Exit(125))
                .reply("run -d", Reply::Stdout("c0ffee\n".into())),
        );
        let r = runner(context("s1,s2", ""), remote);

        let started = r.start(&[NodeType::Server]).await;

        assert_eq!(started.len(), 1);
        assert_eq!(started[0].id, "0");
        assert_eq!(started[0].container_id.as_deref(), Some("c0ffee"));
    }

    #[tokio::test]
    async fn collect_and_kill_touch_every_host() {
        let remote = Arc::new(FakeRemote::default());
        let r = runner(context("s1", "d1,d2"), remote.clone());

        r.collect(&[NodeType::Driver]).await;
        let copies = remote
            .commands()
            .iter()
            .filter(|c| c.starts_with("docker cp"))
            .count();
        assert_eq!(copies, 2);

        r.kill(&[NodeType::Server, NodeType::Driver]).await;
        let kills = remote
            .commands()
            .iter()
            .filter(|c| c.starts_with("pkill"))
            .count();
        assert_eq!(kills, 6);
    }

    #[tokio::test]
    async fn stop_kills_started_nodes_by_pid() {
        let remote = Arc::new(FakeRemote::default());
        let r = runner(context("s1", "d1"), remote.clone());

        let mut server = NodeInfo::new("s1", NodeType::Server, "0");
        server.pid = Some(101);
        server.status = NodeStatus::Running;
        let driver = NodeInfo::new("d1", NodeType::Driver, "0");

        let stopped = r.stop(&[server, driver.clone()]).await;

        assert_eq!(stopped.len(), 2);
        assert_eq!(stopped[0].status, NodeStatus::Stopped);
        assert_eq!(stopped[0].pid, None);
        assert_eq!(stopped[1], driver);
        assert_eq!(remote.commands(), vec!["kill -9 101"]);
    }
}
