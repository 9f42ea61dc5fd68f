// src/exec/backend.rs

//! Pluggable build backend abstraction.
//!
//! The coordinator talks to a `BuildBackend` instead of spawning processes
//! itself. Production code uses [`ProcessBackend`], which runs the real
//! command builder -> launcher -> collector pipeline. Tests can provide a
//! backend that never touches the OS and completes when told to.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::{debug, info};

use crate::engine::LogSink;
use crate::errors::{BuildError, Result};

use super::collector::drain;
use super::command::{BuildRequest, CommandBuilder};
use super::launcher::launch;

/// Trait abstracting how a single build is executed.
pub trait BuildBackend: Send + Sync {
    /// Run the build described by `request`, appending progress and compiler
    /// output to `sink` as it arrives.
    ///
    /// Resolves to the compiler's exit code. A non-zero code is a normal
    /// result, not an error; errors are reserved for builds that never got
    /// as far as an exit code.
    fn execute<'a>(
        &'a self,
        request: &'a BuildRequest,
        sink: &'a LogSink,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;
}

/// Real backend: spawns the toolchain and streams its output.
#[derive(Debug, Clone, Default)]
pub struct ProcessBackend {
    builder: CommandBuilder,
}

impl ProcessBackend {
    pub fn new(builder: CommandBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }
}

impl BuildBackend for ProcessBackend {
    fn execute<'a>(
        &'a self,
        request: &'a BuildRequest,
        sink: &'a LogSink,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let cmd = self.builder.build(request)?;
            remove_stale_output(&request.output_path).await?;

            let tool = cmd
                .program()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "compiler".to_string());
            sink.append_line(&format!("[Compiler] Running {tool}..."));

            let mut child = launch(&cmd)?;
            drain(&mut child, &|line: &str| sink.append_line(line)).await?;
            let code = child.wait().await?;

            info!(
                source = %request.source_path.display(),
                exit_code = code,
                "compiler finished"
            );
            Ok(code)
        })
    }
}

/// Delete a binary left over from an earlier build, so that "output exists"
/// afterwards means this compiler run produced it.
async fn remove_stale_output(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed previous build output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::ConfigError(format!(
            "cannot replace previous output {}: {e}",
            path.display()
        ))),
    }
}
