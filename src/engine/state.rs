// src/engine/state.rs

//! Shared build state.
//!
//! One [`SharedBuildState`] is owned by the coordinator and cloned into the
//! foreground loop. Exactly one writer exists at a time: the [`LogSink`]
//! handed to the running build. Readers only take the lock long enough to
//! copy a flag or the log text, so they never wait on I/O.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::BuildResult;

/// Log line appended when a build is submitted while another is running.
pub const REJECTED_MARKER: &str = "[Compiler] Already compiling.";

#[derive(Debug, Default)]
struct BuildState {
    busy: bool,
    log: String,
    last_result: Option<BuildResult>,
}

/// Cloneable handle to the process-wide build state.
#[derive(Debug, Clone, Default)]
pub struct SharedBuildState {
    inner: Arc<Mutex<BuildState>>,
}

impl SharedBuildState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BuildState> {
        // The state is plain data; a panicking writer cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Snapshot of the log text.
    pub fn current_log(&self) -> String {
        self.lock().log.clone()
    }

    pub fn log_len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    pub fn last_result(&self) -> Option<BuildResult> {
        self.lock().last_result.clone()
    }

    /// Try to move from idle to running.
    ///
    /// On success the log is cleared and the returned sink is the only
    /// writer until it is finished or dropped. If a build is already
    /// running, a rejection line is appended instead and `None` returned.
    pub(crate) fn try_begin(&self) -> Option<LogSink> {
        let mut state = self.lock();
        if state.busy {
            push_line(&mut state.log, REJECTED_MARKER);
            debug!("build rejected: already running");
            return None;
        }
        state.busy = true;
        state.log.clear();
        Some(LogSink {
            state: Arc::clone(&self.inner),
            lines: Mutex::new(Vec::new()),
            finished: false,
        })
    }

    /// Append a rejection line without touching the busy flag.
    pub(crate) fn reject(&self) {
        push_line(&mut self.lock().log, REJECTED_MARKER);
    }
}

fn push_line(log: &mut String, line: &str) {
    log.push_str(line);
    log.push('\n');
}

/// Write access to the log for the single running build.
///
/// Every line goes both to the shared log (visible to pollers right away)
/// and to this build's own line list, which survives a `clear_log` from the
/// foreground. Dropping an unfinished sink returns the state to idle.
#[derive(Debug)]
pub struct LogSink {
    state: Arc<Mutex<BuildState>>,
    lines: Mutex<Vec<String>>,
    finished: bool,
}

impl LogSink {
    pub fn append_line(&self, line: &str) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            push_line(&mut state.log, line);
        }
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    /// Lines this build has produced so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish the result and flip back to idle in one step.
    pub(crate) fn finish(mut self, result: BuildResult) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.last_result = Some(result);
        state.busy = false;
        self.finished = true;
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        if !self.finished {
            warn!("build ended without a result; returning to idle");
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.busy = false;
        }
    }
}
