//! Per-dispatcher settings.

use std::num::NonZeroUsize;
use std::time::Duration;

use yardstick_core::context::{RunContext, DEFAULT_DISPATCH_TIMEOUT};

/// Settings applied uniformly to one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Wait budget for each individual target.
    pub timeout: Duration,
    /// Concurrent invocations; `None` means processor count.
    pub pool_size: Option<usize>,
    /// Stop the round and cancel outstanding invocations when one of
    /// them reports an interruption.
    pub cancel_siblings_on_interrupt: bool,
}

impl DispatchConfig {
    /// Host dispatch: interruptions are skipped like any failure.
    pub fn for_hosts() -> Self {
        Self {
            timeout: DEFAULT_DISPATCH_TIMEOUT,
            pool_size: None,
            cancel_siblings_on_interrupt: false,
        }
    }

    /// Node dispatch: an interruption aborts the round.
    pub fn for_nodes() -> Self {
        Self {
            cancel_siblings_on_interrupt: true,
            ..Self::for_hosts()
        }
    }

    /// Take timeout and pool size from the run configuration.
    pub fn with_context(self, ctx: &RunContext) -> Self {
        Self {
            timeout: ctx.dispatch_timeout,
            pool_size: ctx.pool_size,
            ..self
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size.max(1));
        self
    }

    pub fn cancel_siblings_on_interrupt(mut self, cancel: bool) -> Self {
        self.cancel_siblings_on_interrupt = cancel;
        self
    }

    /// Effective pool size, never zero.
    pub fn pool_size(&self) -> usize {
        self.pool_size
            .unwrap_or_else(available_processors)
            .max(1)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::for_hosts()
    }
}

pub fn available_processors() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
