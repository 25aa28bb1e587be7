//! `yardstick-runner` library crate.
//!
//! Concrete workers plugged into the dispatch engine and the
//! [`DockerRunner`](docker::DockerRunner) that sequences them. The
//! binary entrypoint lives in `main.rs`.

pub mod docker;
pub mod workers;
