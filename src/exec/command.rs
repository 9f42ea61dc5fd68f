// src/exec/command.rs

//! Compiler invocation construction.
//!
//! A [`CommandLine`] is an argv vector, never a shell string: the toolchain
//! binary is spawned directly, so paths with spaces or shell metacharacters
//! need no escaping to reach the compiler intact. Quoting only happens in the
//! [`Display`](std::fmt::Display) rendering used for logs.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{BuildError, Result};

/// Language standard passed as `-std=<..>` when nothing else is configured.
pub const DEFAULT_STD: &str = "c++17";

/// Everything needed to compile one source file.
///
/// Immutable once constructed; owned by the call that issues the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub toolchain_path: PathBuf,
    pub extra_flags: Vec<String>,
}

impl BuildRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        toolchain_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            toolchain_path: toolchain_path.into(),
            extra_flags: Vec::new(),
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_flags.extend(flags.into_iter().map(Into::into));
        self
    }
}

/// A program plus its argument list, ready to hand to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Full argv: program first, then arguments.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.as_os_str().to_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(self.program.as_os_str()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Render an argument for display, wrapping it in double quotes when it
/// contains whitespace or quote characters.
fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() {
        return "\"\"".to_string();
    }
    if s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.into_owned()
    }
}

/// Turns a [`BuildRequest`] into a compiler [`CommandLine`].
///
/// Produces `<toolchain> <source> -o <output> -std=<std> [extra flags...]`.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    std: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self {
            std: DEFAULT_STD.to_string(),
        }
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the `-std=` value (e.g. `"c++20"`).
    pub fn with_std(mut self, std: impl Into<String>) -> Self {
        self.std = std.into();
        self
    }

    pub fn std(&self) -> &str {
        &self.std
    }

    /// Validate the request and produce the compiler invocation.
    ///
    /// Fails with [`BuildError::ConfigError`] if the toolchain or the source
    /// does not exist; nothing is spawned in that case. On success the
    /// output's parent directories exist.
    pub fn build(&self, request: &BuildRequest) -> Result<CommandLine> {
        let toolchain = resolve_toolchain(&request.toolchain_path).ok_or_else(|| {
            BuildError::ConfigError(format!(
                "toolchain not found at {}",
                request.toolchain_path.display()
            ))
        })?;

        if !request.source_path.is_file() {
            return Err(BuildError::ConfigError(format!(
                "source file not found at {}",
                request.source_path.display()
            )));
        }

        ensure_parent_dir(&request.output_path)?;

        let mut cmd = CommandLine::new(toolchain)
            .arg(&request.source_path)
            .arg("-o")
            .arg(&request.output_path)
            .arg(format!("-std={}", self.std));

        for flag in &request.extra_flags {
            cmd = cmd.arg(flag);
        }

        debug!(command = %cmd, "built compiler command line");
        Ok(cmd)
    }
}

/// Create missing parent directories of `path`. Idempotent.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| {
                BuildError::ConfigError(format!(
                    "cannot create output directory {}: {e}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

/// Resolve a toolchain path to an existing file.
///
/// Paths with a directory component are taken as given. A bare program name
/// such as `g++` is searched for on `PATH`.
pub fn resolve_toolchain(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }

    if path.components().count() > 1 || path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .flat_map(|dir| candidates(&dir, path))
        .find(|candidate| candidate.is_file())
}

fn candidates(dir: &Path, name: &Path) -> Vec<PathBuf> {
    let plain = dir.join(name);
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() || name.extension().is_some() {
        vec![plain]
    } else {
        let mut with_ext = plain.clone().into_os_string();
        with_ext.push(suffix);
        vec![plain, PathBuf::from(with_ext)]
    }
}
