// src/exec/launcher.rs

//! Child process creation for compiler runs.

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::{BuildError, Result};
use crate::exec::command::CommandLine;

/// `CREATE_NO_WINDOW`: the child gets no console window of its own.
#[cfg(windows)]
pub(crate) const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A running compiler process and the read ends of its output pipes.
///
/// Owned by one build at a time. Dropping the handle kills the child if it
/// is still running, and closes every pipe that has not been taken.
#[derive(Debug)]
pub struct ChildProcessHandle {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl ChildProcessHandle {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub(crate) fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub(crate) fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Wait for the child to exit and return its exit code.
    ///
    /// A child terminated without a code (e.g. by a signal) reports `-1`.
    /// Closes stdin first, as `tokio` does; any pipes not yet drained stay
    /// open until the handle is dropped.
    pub async fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().await?;
        let code = status.code().unwrap_or(-1);
        debug!(pid = ?self.child.id(), exit_code = code, "child process exited");
        Ok(code)
    }
}

/// Spawn `cmd` with stdout and stderr piped back to the caller.
///
/// Returns as soon as the process exists; it does not wait for it. Stdin is
/// closed so a compiler that unexpectedly prompts cannot hang on input.
pub fn launch(cmd: &CommandLine) -> Result<ChildProcessHandle> {
    let mut command = Command::new(cmd.program());
    command
        .args(cmd.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    configure_no_console(&mut command);

    let mut child = command.spawn().map_err(|e| {
        warn!(program = %cmd.program().display(), error = %e, "failed to spawn child process");
        BuildError::spawn(cmd.program(), &e)
    })?;

    info!(pid = ?child.id(), command = %cmd, "spawned child process");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    Ok(ChildProcessHandle {
        child,
        stdout,
        stderr,
    })
}

#[cfg(windows)]
fn configure_no_console(command: &mut Command) {
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_no_console(_command: &mut Command) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_spawn_error_with_os_code() {
        let cmd = CommandLine::new("/definitely/not/here/g++").arg("x.cpp");
        let err = launch(&cmd).unwrap_err();
        match err {
            BuildError::SpawnError { code, .. } => assert_eq!(code, Some(2)),
            other => panic!("expected SpawnError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exit_code_is_reported() {
        let cmd = CommandLine::new("/bin/sh").arg("-c").arg("exit 3");
        let mut handle = launch(&cmd).unwrap();
        assert_eq!(handle.wait().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn both_pipes_are_handed_to_caller() {
        let cmd = CommandLine::new("/bin/sh").arg("-c").arg("true");
        let mut handle = launch(&cmd).unwrap();
        assert!(handle.take_stdout().is_some());
        assert!(handle.take_stderr().is_some());
        assert!(handle.take_stdout().is_none());
        handle.wait().await.unwrap();
    }
}
