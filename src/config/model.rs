// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::CoordinatorOptions;
use crate::exec::command::DEFAULT_STD;
use crate::exec::{BuildRequest, CommandBuilder, ProcessBackend};
use crate::runner::LaunchPolicy;

/// Settings exactly as stored on disk.
///
/// ```json
/// {
///   "mingw_path": "mingw64/bin/g++.exe",
///   "std": "c++17",
///   "extra_flags": ["-static-libgcc", "-static-libstdc++"],
///   "log_file": "build/last_build.log",
///   "verify_output": true
/// }
/// ```
///
/// Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSettings {
    /// Path to the compiler binary. The key name is kept from the MinGW
    /// days; any GCC-compatible driver works.
    #[serde(default = "default_toolchain_path")]
    pub mingw_path: PathBuf,

    #[serde(default = "default_std")]
    pub std: String,

    #[serde(default = "default_extra_flags")]
    pub extra_flags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    #[serde(default = "default_verify_output")]
    pub verify_output: bool,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            mingw_path: default_toolchain_path(),
            std: default_std(),
            extra_flags: default_extra_flags(),
            log_file: None,
            verify_output: default_verify_output(),
        }
    }
}

/// Conventional bundled compiler location, relative to the working directory.
pub fn default_toolchain_path() -> PathBuf {
    let mut name = String::from("g++");
    name.push_str(std::env::consts::EXE_SUFFIX);
    Path::new("mingw64").join("bin").join(name)
}

fn default_std() -> String {
    DEFAULT_STD.to_string()
}

fn default_extra_flags() -> Vec<String> {
    vec!["-static-libgcc".to_string(), "-static-libstdc++".to_string()]
}

fn default_verify_output() -> bool {
    true
}

/// Validated settings.
///
/// Only obtainable through `TryFrom<RawSettings>` (see `validate.rs`), so
/// holders can rely on a non-empty toolchain path and a sane `-std` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    raw: RawSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new_unchecked(RawSettings::default())
    }
}

impl Settings {
    pub(crate) fn new_unchecked(raw: RawSettings) -> Self {
        Self { raw }
    }

    pub fn toolchain_path(&self) -> &Path {
        &self.raw.mingw_path
    }

    pub fn std(&self) -> &str {
        &self.raw.std
    }

    pub fn extra_flags(&self) -> &[String] {
        &self.raw.extra_flags
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.raw.log_file.as_deref()
    }

    pub fn verify_output(&self) -> bool {
        self.raw.verify_output
    }

    pub fn raw(&self) -> &RawSettings {
        &self.raw
    }

    pub fn into_raw(self) -> RawSettings {
        self.raw
    }

    /// A build request for `source` -> `output` using these settings'
    /// toolchain and flags, followed by `more_flags`.
    pub fn request(
        &self,
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        more_flags: &[String],
    ) -> BuildRequest {
        BuildRequest::new(source, output, self.toolchain_path())
            .with_flags(self.raw.extra_flags.iter().cloned())
            .with_flags(more_flags.iter().cloned())
    }

    pub fn command_builder(&self) -> CommandBuilder {
        CommandBuilder::new().with_std(self.raw.std.clone())
    }

    pub fn backend(&self) -> ProcessBackend {
        ProcessBackend::new(self.command_builder())
    }

    pub fn coordinator_options(&self, launch_policy: LaunchPolicy) -> CoordinatorOptions {
        CoordinatorOptions {
            verify_output: self.raw.verify_output,
            log_file: self.raw.log_file.clone(),
            launch_policy,
        }
    }
}
