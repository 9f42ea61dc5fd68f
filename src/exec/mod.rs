// src/exec/mod.rs

//! Process execution layer.
//!
//! This module turns a build request into a finished compiler process,
//! using `tokio::process::Command`, and streams what the compiler prints.
//!
//! - [`command`] validates a [`BuildRequest`] and produces the argv.
//! - [`launcher`] spawns the toolchain with both output streams piped and no
//!   console window.
//! - [`collector`] drains those pipes line by line while the child runs.
//! - [`backend`] provides the `BuildBackend` trait and the concrete
//!   `ProcessBackend` that chains the three, and which tests can replace
//!   with a fake implementation.

pub mod backend;
pub mod collector;
pub mod command;
pub mod launcher;

pub use backend::{BuildBackend, ProcessBackend};
pub use collector::drain;
pub use command::{BuildRequest, CommandBuilder, CommandLine};
pub use launcher::{ChildProcessHandle, launch};
