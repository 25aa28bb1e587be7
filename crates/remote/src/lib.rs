//! `yardstick-remote` -- remote command execution.
//!
//! Workers never spawn processes themselves; they go through the
//! [`RemoteExecutor`] trait so the dispatch engine can be driven by
//! real SSH in production and by recording fakes in tests.

pub mod error;
pub mod executor;
pub mod ssh;
pub mod subprocess;

pub use error::RemoteError;
pub use executor::{CommandOutput, RemoteExecutor};
pub use ssh::SshExecutor;
