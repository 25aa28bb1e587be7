//! `yardstick-runner` -- drives benchmark nodes in docker across a fleet.
//!
//! Reads the fleet inventory from the environment (see
//! [`RunContext::from_env`]) and runs one stage of the docker lifecycle
//! against every configured host.
//!
//! # Stages
//!
//! | Stage          | Action                                                |
//! |----------------|-------------------------------------------------------|
//! | `check`        | Verify docker answers on every host                   |
//! | `clean-before` | Remove containers/images flagged for before start     |
//! | `prepare`      | Build server/driver images                            |
//! | `start`        | Start one container per node                          |
//! | `deploy`       | `check`, `clean-before`, `prepare`, `start`           |
//! | `collect`      | Copy benchmark output out of the containers           |
//! | `kill`         | Kill yardstick processes on every host                |
//! | `clean-after`  | Remove containers/images flagged for after finish     |
//! | `teardown`     | `collect`, `kill`, `clean-after`                      |
//! | `stop`         | Kill `--nodes` (JSON from `start`) by pid             |

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yardstick_core::context::{CleanStage, RunContext};
use yardstick_core::node::{NodeInfo, NodeStatus, NodeType};
use yardstick_remote::SshExecutor;
use yardstick_runner::docker::DockerRunner;

#[derive(Debug, Parser)]
#[command(name = "yardstick-runner", version, about = "Run yardstick benchmark nodes in docker")]
struct Cli {
    /// Lifecycle stage to run.
    #[arg(value_enum)]
    stage: Stage,

    /// Limit the stage to one node type.
    #[arg(long, value_enum)]
    only: Option<OnlyType>,

    /// Node list written by `start`, required by `stop`.
    #[arg(long, required_if_eq("stage", "stop"))]
    nodes: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    Check,
    CleanBefore,
    Prepare,
    Start,
    Deploy,
    Collect,
    Kill,
    CleanAfter,
    Teardown,
    Stop,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnlyType {
    Server,
    Driver,
}

impl From<OnlyType> for NodeType {
    fn from(t: OnlyType) -> Self {
        match t {
            OnlyType::Server => NodeType::Server,
            OnlyType::Driver => NodeType::Driver,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yardstick_runner=info,yardstick_dispatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let ctx = match RunContext::from_env() {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let node_types: Vec<NodeType> = match cli.only {
        Some(only) => vec![only.into()],
        None => ctx.enabled_node_types(),
    };

    tracing::info!(
        stage = ?cli.stage,
        hosts = ctx.unique_hosts().len(),
        remote_work_dir = %ctx.remote_work_dir,
        "Starting yardstick-runner",
    );

    let remote = Arc::new(SshExecutor::from_context(&ctx));
    let runner = DockerRunner::new(ctx, remote);

    tokio::select! {
        code = run_stage(&runner, &cli, &node_types) => code,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping");
            ExitCode::from(130)
        }
    }
}

async fn run_stage(runner: &DockerRunner, cli: &Cli, node_types: &[NodeType]) -> ExitCode {
    match cli.stage {
        Stage::Check => {
            if runner.check(node_types).await {
                return ExitCode::FAILURE;
            }
        }
        Stage::CleanBefore => runner.clean_up(node_types, CleanStage::BeforeStart).await,
        Stage::Prepare => runner.prepare(node_types).await,
        Stage::Start => report_started(runner, node_types).await,
        Stage::Deploy => {
            if runner.check(node_types).await {
                tracing::error!("Docker check failed, aborting deploy");
                return ExitCode::FAILURE;
            }
            runner.clean_up(node_types, CleanStage::BeforeStart).await;
            runner.prepare(node_types).await;
            report_started(runner, node_types).await;
        }
        Stage::Collect => runner.collect(node_types).await,
        Stage::Kill => runner.kill(node_types).await,
        Stage::CleanAfter => runner.clean_up(node_types, CleanStage::AfterFinish).await,
        Stage::Teardown => {
            runner.collect(node_types).await;
            runner.kill(node_types).await;
            runner.clean_up(node_types, CleanStage::AfterFinish).await;
        }
        Stage::Stop => {
            let Some(path) = cli.nodes.as_deref() else {
                tracing::error!("--nodes is required for stop");
                return ExitCode::FAILURE;
            };
            let nodes = match load_nodes(path).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read node list");
                    return ExitCode::FAILURE;
                }
            };
            let nodes: Vec<NodeInfo> = nodes
                .into_iter()
                .filter(|n| node_types.contains(&n.node_type))
                .collect();

            let stopped = runner.stop(&nodes).await;
            let count = stopped
                .iter()
                .filter(|n| n.status == NodeStatus::Stopped)
                .count();
            tracing::info!(count, total = nodes.len(), "Nodes stopped");
        }
    }

    ExitCode::SUCCESS
}

async fn load_nodes(path: &Path) -> Result<Vec<NodeInfo>, Box<dyn std::error::Error>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Start nodes and print the running ones as JSON on stdout.
async fn report_started(runner: &DockerRunner, node_types: &[NodeType]) {
    let started = runner.start(node_types).await;
    tracing::info!(count = started.len(), "Nodes started");

    match serde_json::to_string_pretty(&started) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize started nodes"),
    }
}
