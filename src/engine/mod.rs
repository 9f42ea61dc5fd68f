// src/engine/mod.rs

//! Build orchestration engine.
//!
//! - [`state`] holds the shared busy flag, the live log, and the last result.
//! - [`coordinator`] owns that state plus the single in-flight build task and
//!   exposes the non-blocking surface the UI polls (`submit_build`,
//!   `is_busy`, `current_log`, `clear_log`, `run_program`).
//!
//! The lifecycle is `Idle -> Running -> Idle`. There is no queue and no
//! cancellation: a submit while running is rejected with a log line, and a
//! running build ends only when its compiler process does.

use crate::diagnostics::Diagnostic;
use crate::exec::BuildRequest;

pub mod coordinator;
pub mod state;

pub use coordinator::{BuildCoordinator, CoordinatorOptions, SubmitOutcome};
pub use state::{LogSink, SharedBuildState};

/// How a finished build ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Exit code 0 and (when checked) the output binary exists.
    Success,
    /// The compiler ran and reported failure. Carries its exit code; `0`
    /// means it exited cleanly but the expected binary never appeared.
    Failed(i32),
    /// The build never got a compiler exit code (bad config, spawn failure,
    /// I/O error while draining).
    Aborted(String),
}

/// Everything known about one build once it has finished.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub request: BuildRequest,
    pub outcome: BuildOutcome,
    /// Compiler exit code, or `-1` if there is none.
    pub exit_code: i32,
    /// Whether `request.output_path` existed when the build ended.
    pub output_exists: bool,
    /// Every line this build logged, in emission order.
    pub combined_log: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == BuildOutcome::Success
    }
}
