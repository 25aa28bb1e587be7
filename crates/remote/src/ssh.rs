//! SSH-backed [`RemoteExecutor`].
//!
//! Commands for local hosts run through `bash -c` directly; everything
//! else goes through the system `ssh` client with host key checking
//! disabled, matching how benchmark fleets are usually provisioned.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use yardstick_core::context::RunContext;

use crate::error::RemoteError;
use crate::executor::{CommandOutput, RemoteExecutor};
use crate::subprocess;

const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// Runs commands over `ssh`, or locally for loopback hosts.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    user: Option<String>,
    docker_sudo: bool,
    timeout: Duration,
}

impl SshExecutor {
    pub fn new(user: Option<String>, docker_sudo: bool, timeout: Duration) -> Self {
        Self {
            user,
            docker_sudo,
            timeout,
        }
    }

    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(
            ctx.ssh_user.clone(),
            ctx.docker.use_sudo,
            ctx.command_timeout,
        )
    }

    pub fn is_local(host: &str) -> bool {
        LOCAL_HOSTS.contains(&host)
    }

    /// Program and arguments used to run `cmd` on `host`.
    fn command_line(&self, host: &str, cmd: &str) -> (&'static str, Vec<String>) {
        if Self::is_local(host) {
            return ("bash", vec!["-c".to_string(), cmd.to_string()]);
        }

        let target = match &self.user {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        };

        (
            "ssh",
            vec![
                "-o".to_string(),
                "StrictHostKeyChecking=no".to_string(),
                "-o".to_string(),
                "BatchMode=yes".to_string(),
                target,
                cmd.to_string(),
            ],
        )
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn run_cmd(&self, host: &str, cmd: &str) -> Result<CommandOutput, RemoteError> {
        let (program, args) = self.command_line(host, cmd);

        tracing::debug!(host, cmd, "Running remote command");

        let mut command = Command::new(program);
        command.args(&args);
        subprocess::run_command(&mut command, host, self.timeout).await
    }

    async fn run_docker_cmd(&self, host: &str, cmd: &str) -> Result<CommandOutput, RemoteError> {
        let full = if self.docker_sudo {
            format!("sudo docker {cmd}")
        } else {
            format!("docker {cmd}")
        };
        self.run_cmd(host, &full).await
    }
}
