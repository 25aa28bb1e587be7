/// Failure of a single per-target invocation.
///
/// The dispatchers never propagate these to the caller; they decide
/// whether to skip the target or abort the round.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// The invocation was interrupted; the node dispatcher treats this
    /// as a signal to stop the whole round.
    #[error("work was interrupted")]
    Interrupted,

    /// The dispatcher cancelled the invocation before it finished.
    #[error("work was cancelled")]
    Cancelled,

    #[error("work failed: {0}")]
    Failed(String),
}
