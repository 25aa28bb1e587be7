//! Concrete units of work.
//!
//! Host workers run once per host entry; node workers once per logical
//! node. Remote failures are logged and folded into an empty result,
//! except interruptions, which are surfaced so the node dispatcher can
//! stop the round.

mod docker_build;
mod docker_check;
mod docker_clean;
mod docker_collect;
mod docker_start;
mod kill;

pub use docker_build::DockerBuildImagesWorker;
pub use docker_check::DockerCheckWorker;
pub use docker_clean::{DockerCleanContWorker, DockerCleanImagesWorker};
pub use docker_collect::DockerCollectWorker;
pub use docker_start::DockerStartContWorker;
pub use kill::{KillNodeWorker, KillWorker};

use yardstick_dispatch::{WorkError, WorkResult};
use yardstick_remote::RemoteError;

/// Log a remote failure and decide what the dispatcher sees.
pub(crate) fn remote_failure(worker: &str, err: RemoteError) -> Result<WorkResult, WorkError> {
    match err {
        RemoteError::Interrupted { host } => {
            tracing::info!(worker, host = %host, "Remote command interrupted");
            Err(WorkError::Interrupted)
        }
        other => {
            tracing::error!(worker, host = %other.host(), error = %other, "Remote command failed");
            Ok(WorkResult::Empty)
        }
    }
}
