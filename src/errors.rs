// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! A compiler exiting non-zero is *not* an error here; it is a
//! [`BuildOutcome::Failed`](crate::engine::BuildOutcome) carried in the
//! build result. Everything in this enum is recoverable: the coordinator
//! turns it into a log line and returns to idle.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    /// Missing toolchain/source or unusable settings. Raised before any
    /// process is spawned.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The OS refused to create the child process.
    #[error("Failed to start {program:?} (os error {}): {message}", os_code(.code))]
    SpawnError {
        program: PathBuf,
        code: Option<i32>,
        message: String,
    },

    /// The Program Runner could not start a built binary.
    #[error("Launch failed: {0}")]
    LaunchFailure(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    pub(crate) fn spawn(program: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        BuildError::SpawnError {
            program: program.into(),
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

fn os_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
