// src/runner.rs

//! Launching built programs.
//!
//! The runner only reports whether the OS started the program. It never
//! waits for it, never reads its output, and never learns its exit code.
//! Dropped children are reaped in the background by Tokio.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::{BuildError, Result};

/// How a built program is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchPolicy {
    /// Interactive: the program keeps the terminal's stdio (on Windows it
    /// gets a console window of its own) and runs independently of the
    /// caller.
    #[default]
    Detached,
    /// No console and all stdio discarded, for programs whose output the
    /// caller does not care about.
    Silent,
}

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

#[derive(Debug, Clone, Default)]
pub struct ProgramRunner {
    policy: LaunchPolicy,
    working_dir: Option<PathBuf>,
}

impl ProgramRunner {
    pub fn new(policy: LaunchPolicy) -> Self {
        Self {
            policy,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn policy(&self) -> LaunchPolicy {
        self.policy
    }

    /// Start `exe_path` and return its process id.
    ///
    /// Must be called from within a Tokio runtime; outside one this fails
    /// with [`BuildError::LaunchFailure`] instead of panicking.
    pub fn launch(&self, exe_path: &Path) -> Result<u32> {
        if !exe_path.is_file() {
            return Err(BuildError::LaunchFailure(format!(
                "executable not found at {}",
                exe_path.display()
            )));
        }

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(BuildError::LaunchFailure(
                "no async runtime available to supervise the program".to_string(),
            ));
        }

        let mut command = Command::new(exe_path);
        command.kill_on_drop(false);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        self.apply_policy(&mut command);

        let child = command.spawn().map_err(|e| {
            BuildError::LaunchFailure(format!("could not start {}: {e}", exe_path.display()))
        })?;

        let pid = child.id().unwrap_or_default();
        info!(exe = %exe_path.display(), pid, policy = ?self.policy, "program launched");
        Ok(pid)
    }

    /// Like [`launch`](Self::launch) but reports only success or failure.
    pub fn run(&self, exe_path: &Path) -> bool {
        match self.launch(exe_path) {
            Ok(_) => true,
            Err(e) => {
                warn!(exe = %exe_path.display(), error = %e, "program launch failed");
                false
            }
        }
    }

    fn apply_policy(&self, command: &mut Command) {
        match self.policy {
            LaunchPolicy::Detached => {
                command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
                #[cfg(windows)]
                command.creation_flags(CREATE_NEW_CONSOLE);
            }
            LaunchPolicy::Silent => {
                command
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                #[cfg(windows)]
                command.creation_flags(crate::exec::launcher::CREATE_NO_WINDOW);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_returns_false() {
        let runner = ProgramRunner::new(LaunchPolicy::Silent);
        assert!(!runner.run(Path::new("/no/such/program")));
    }

    #[test]
    fn missing_executable_is_launch_failure() {
        let err = ProgramRunner::default()
            .launch(Path::new("/no/such/program"))
            .unwrap_err();
        assert!(matches!(err, BuildError::LaunchFailure(ref m) if m.contains("not found")));
    }

    #[test]
    fn directory_is_not_an_executable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!ProgramRunner::default().run(dir.path()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_launch_of_real_program_succeeds() {
        let runner = ProgramRunner::new(LaunchPolicy::Silent);
        assert!(runner.run(Path::new("/bin/sh")));
    }

    #[cfg(unix)]
    #[test]
    fn launch_outside_runtime_fails_cleanly() {
        let err = ProgramRunner::new(LaunchPolicy::Silent)
            .launch(Path::new("/bin/sh"))
            .unwrap_err();
        assert!(matches!(err, BuildError::LaunchFailure(_)));
    }
}
