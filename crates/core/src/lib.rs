//! `yardstick-core` -- shared inventory types for the yardstick runner.
//!
//! Holds the node descriptors handed to the dispatch engine and the
//! run-wide [`RunContext`](context::RunContext) that concrete workers read.

pub mod context;
pub mod error;
pub mod node;
