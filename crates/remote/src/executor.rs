//! The remote execution seam.

use async_trait::async_trait;

use crate::error::RemoteError;

/// Captured result of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Non-empty trimmed stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Runs shell commands on a fleet host.
///
/// A non-zero exit is reported as [`RemoteError::NonZeroExit`], so a
/// returned [`CommandOutput`] always has `exit_code == 0`.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn run_cmd(&self, host: &str, cmd: &str) -> Result<CommandOutput, RemoteError>;

    /// Run `docker <cmd>` on `host`.
    async fn run_docker_cmd(&self, host: &str, cmd: &str) -> Result<CommandOutput, RemoteError> {
        self.run_cmd(host, &format!("docker {cmd}")).await
    }

    /// `true` when the docker daemon answers on `host`.
    async fn check_docker(&self, host: &str) -> bool {
        match self.run_docker_cmd(host, "version").await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(host, error = %e, "docker version failed");
                false
            }
        }
    }
}
