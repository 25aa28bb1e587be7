/// Failures reported by a [`RemoteExecutor`](crate::RemoteExecutor).
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("I/O error on {host}: {source}")]
    Io {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command on {host} exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        host: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Command on {host} timed out after {elapsed_ms}ms")]
    Timeout { host: String, elapsed_ms: u64 },

    /// The process was terminated by a signal before it could exit.
    #[error("Command on {host} was interrupted")]
    Interrupted { host: String },
}

impl RemoteError {
    pub fn host(&self) -> &str {
        match self {
            Self::Io { host, .. }
            | Self::NonZeroExit { host, .. }
            | Self::Timeout { host, .. }
            | Self::Interrupted { host } => host,
        }
    }
}
