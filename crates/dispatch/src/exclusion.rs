//! Per-host exclusion tokens for one node dispatch call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use yardstick_core::node::NodeInfo;

/// One binary lock per distinct host, built fresh for each call.
///
/// Tokens are taken as owned guards so they are released on every exit
/// path of a task, including errors, panics and cancellation.
pub(crate) struct HostLocks {
    locks: HashMap<String, Arc<Mutex<()>>>,
}

impl HostLocks {
    pub(crate) fn for_nodes(nodes: &[NodeInfo]) -> Self {
        let mut locks = HashMap::new();
        for node in nodes {
            locks
                .entry(node.host.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())));
        }
        Self { locks }
    }

    pub(crate) fn token(&self, host: &str) -> Option<Arc<Mutex<()>>> {
        self.locks.get(host).cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Wait for `token` (if any) and hold it until the guard drops.
pub(crate) async fn acquire(token: Option<Arc<Mutex<()>>>) -> Option<OwnedMutexGuard<()>> {
    match token {
        Some(lock) => Some(lock.lock_owned().await),
        None => None,
    }
}
