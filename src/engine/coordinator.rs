// src/engine/coordinator.rs

//! The build coordinator: single-flight guard around the build backend.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::diagnostics::{self, Severity};
use crate::exec::{BuildBackend, BuildRequest};
use crate::runner::{LaunchPolicy, ProgramRunner};

use super::state::{LogSink, SharedBuildState};
use super::{BuildOutcome, BuildResult};

pub const SUCCESS_MARKER: &str = "[Compiler] Compilation successful.";
pub const FAILURE_MARKER: &str = "[Compiler] Compilation failed";

/// Knobs that shape how a finished build is judged and recorded.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Require the output binary to exist for a build to count as a success.
    pub verify_output: bool,
    /// If set, the combined log of every build is written here when it ends.
    pub log_file: Option<PathBuf>,
    /// How `run_program` launches built binaries.
    pub launch_policy: LaunchPolicy,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            verify_output: true,
            log_file: None,
            launch_policy: LaunchPolicy::Detached,
        }
    }
}

/// Result of [`BuildCoordinator::submit_build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The build was started on a background task.
    Accepted,
    /// Another build is running; a rejection line was appended to the log.
    Rejected,
}

/// Owns the shared build state and at most one in-flight build task.
///
/// Every public method returns without waiting on the compiler, so it is
/// safe to call from a render/poll loop. The build itself runs on the Tokio
/// runtime the coordinator was created with.
pub struct BuildCoordinator {
    state: SharedBuildState,
    backend: Arc<dyn BuildBackend>,
    options: CoordinatorOptions,
    runtime: Handle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for BuildCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildCoordinator")
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BuildCoordinator {
    pub fn new(
        backend: impl BuildBackend + 'static,
        options: CoordinatorOptions,
        runtime: Handle,
    ) -> Self {
        Self {
            state: SharedBuildState::new(),
            backend: Arc::new(backend),
            options,
            runtime,
            task: Mutex::new(None),
        }
    }

    /// A read handle to the state, for loops that should not hold the
    /// coordinator itself.
    pub fn state(&self) -> SharedBuildState {
        self.state.clone()
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn current_log(&self) -> String {
        self.state.current_log()
    }

    pub fn clear_log(&self) {
        self.state.clear_log();
    }

    pub fn last_result(&self) -> Option<BuildResult> {
        self.state.last_result()
    }

    /// Start a build in the background, or reject it if one is running.
    ///
    /// A rejected submit spawns nothing and leaves the current log intact
    /// apart from the appended rejection line.
    pub fn submit_build(&self, request: BuildRequest) -> SubmitOutcome {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);

        // The previous task may still be unwinding after it published its
        // result; it has to be gone before a new one takes the slot.
        if slot.as_ref().is_some_and(|h| !h.is_finished()) && !self.state.is_busy() {
            debug!("previous build task still finishing; rejecting");
            self.state.reject();
            return SubmitOutcome::Rejected;
        }

        let Some(sink) = self.state.try_begin() else {
            info!(source = %request.source_path.display(), "build rejected: already compiling");
            return SubmitOutcome::Rejected;
        };

        info!(
            source = %request.source_path.display(),
            output = %request.output_path.display(),
            "build accepted"
        );

        let backend = Arc::clone(&self.backend);
        let options = self.options.clone();
        *slot = Some(
            self.runtime
                .spawn(run_build(backend, request, sink, options)),
        );

        SubmitOutcome::Accepted
    }

    /// Wait for the in-flight build task, if any, to finish.
    ///
    /// Meant for CLIs and tests; a render loop should poll
    /// [`is_busy`](Self::is_busy) instead.
    pub async fn wait_idle(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "build task ended abnormally");
            }
        }
    }

    /// Launch a built binary using the configured policy.
    ///
    /// Returns `false` (never panics) if the file is missing or the OS
    /// refuses to start it.
    pub fn run_program(&self, exe_path: &Path) -> bool {
        let _guard = self.runtime.enter();
        ProgramRunner::new(self.options.launch_policy).run(exe_path)
    }
}

/// Body of the background build task.
async fn run_build(
    backend: Arc<dyn BuildBackend>,
    request: BuildRequest,
    sink: LogSink,
    options: CoordinatorOptions,
) {
    let executed = backend.execute(&request, &sink).await;

    let (outcome, exit_code) = match executed {
        Ok(code) => (judge(code, &request, &options), code),
        Err(err) => {
            warn!(error = %err, "build aborted");
            sink.append_line(&format!("[Compiler] Error: {err}"));
            (BuildOutcome::Aborted(err.to_string()), -1)
        }
    };

    let output_exists = request.output_path.is_file();
    let diagnostics = diagnostics::parse_lines(&sink.lines());

    if !diagnostics.is_empty() {
        let errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        sink.append_line(&format!(
            "[Compiler] {errors} error(s), {warnings} warning(s)."
        ));
    }

    match &outcome {
        BuildOutcome::Success => sink.append_line(SUCCESS_MARKER),
        BuildOutcome::Failed(0) => sink.append_line(&format!(
            "{FAILURE_MARKER}: {} was not produced.",
            request.output_path.display()
        )),
        BuildOutcome::Failed(code) => {
            sink.append_line(&format!("{FAILURE_MARKER} (exit code {code})."))
        }
        BuildOutcome::Aborted(_) => {}
    }

    let combined_log = sink.lines();

    if let Some(path) = &options.log_file {
        if let Err(e) = write_log_file(path, &combined_log).await {
            warn!(path = %path.display(), error = %e, "could not write build log file");
        }
    }

    info!(?outcome, exit_code, output_exists, "build finished");

    sink.finish(BuildResult {
        request,
        outcome,
        exit_code,
        output_exists,
        combined_log,
        diagnostics,
    });
}

fn judge(code: i32, request: &BuildRequest, options: &CoordinatorOptions) -> BuildOutcome {
    if code != 0 {
        return BuildOutcome::Failed(code);
    }
    if options.verify_output && !request.output_path.is_file() {
        return BuildOutcome::Failed(0);
    }
    BuildOutcome::Success
}

async fn write_log_file(path: &Path, lines: &[String]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut text = lines.join("\n");
    text.push('\n');
    tokio::fs::write(path, text).await
}
