//! `yardstick-dispatch` -- one-round fan-out/fan-in over a fleet.
//!
//! A caller builds a concrete worker, wraps it in an `Arc`, and hands it
//! to either the [`HostDispatcher`] (one invocation per host entry) or
//! the [`NodeDispatcher`] (one invocation per logical node, optionally
//! serialized per physical host). Both return whatever results arrived
//! within the per-target timeout and never fail outward.

pub mod config;
pub mod error;
pub mod host;
pub mod node;
pub mod result;
pub mod worker;

mod exclusion;
mod pool;

pub use config::DispatchConfig;
pub use error::WorkError;
pub use host::HostDispatcher;
pub use node::NodeDispatcher;
pub use result::{CheckWorkResult, WorkResult};
pub use worker::{HostWorker, NodeWorker, Worker};
