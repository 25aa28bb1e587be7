//! Child process execution with timeout and output capture.
//!
//! [`run_command`] is shared by every transport: the caller builds the
//! [`tokio::process::Command`] (local `bash -c` or `ssh`) and this module
//! handles spawn, I/O capture and the timeout.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::RemoteError;
use crate::executor::CommandOutput;

/// Maximum stdout or stderr size captured per stream (4 MiB).
const MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Spawn `cmd`, capture stdout/stderr and enforce `timeout`.
///
/// `host` is only used to label errors.
pub async fn run_command(
    cmd: &mut Command,
    host: &str,
    timeout: Duration,
) -> Result<CommandOutput, RemoteError> {
    // `kill_on_drop(true)` kills the child when the timeout drops it.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| RemoteError::Io {
        host: host.to_string(),
        source,
    })?;

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let status = match wait_result {
        Ok(Ok(status)) => status,
        Ok(Err(source)) => {
            return Err(RemoteError::Io {
                host: host.to_string(),
                source,
            })
        }
        Err(_elapsed) => {
            return Err(RemoteError::Timeout {
                host: host.to_string(),
                elapsed_ms: duration_ms,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();

    match status.code() {
        Some(0) => Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: 0,
            duration_ms,
        }),
        Some(exit_code) => Err(RemoteError::NonZeroExit {
            host: host.to_string(),
            exit_code,
            stderr: stderr.trim().to_string(),
        }),
        // No exit code means the process died from a signal.
        None => Err(RemoteError::Interrupted {
            host: host.to_string(),
        }),
    }
}

/// Read an entire output stream, keeping at most [`MAX_OUTPUT_BYTES`].
///
/// The remainder is drained and discarded so a chatty child never dies
/// of SIGPIPE.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}
