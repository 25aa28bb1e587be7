//! Unit-of-work traits.
//!
//! A worker is built for one dispatch call, handed to a dispatcher as an
//! `Arc`, and dropped once the call returns. The dispatcher owns *when*
//! and *how many at once*; the worker owns *what* happens per target.

use std::time::Duration;

use async_trait::async_trait;
use yardstick_core::node::NodeInfo;

use crate::error::WorkError;
use crate::result::WorkResult;

/// Lifecycle shared by host and node workers.
///
/// `before_work` runs once before any invocation starts and `after_work`
/// once after collection finished or the round was aborted. Neither is
/// guarded by the dispatcher.
pub trait Worker: Send + Sync {
    /// Label used in log fields.
    fn name(&self) -> &str;

    /// Per-target wait budget; `None` uses the dispatcher's.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn before_work(&self) {
        tracing::info!(worker = %self.name(), "Starting work");
    }

    fn after_work(&self) {
        tracing::debug!(worker = %self.name(), "Work finished");
    }
}

/// Work performed once per host entry.
#[async_trait]
pub trait HostWorker: Worker {
    /// `index` is the entry's position in the host list, for naming only.
    async fn do_work(&self, host: &str, index: usize) -> Result<WorkResult, WorkError>;
}

/// Work performed once per logical node.
#[async_trait]
pub trait NodeWorker: Worker {
    async fn do_work(&self, node: &NodeInfo) -> Result<WorkResult, WorkError>;
}
