// src/project/mod.rs

//! On-disk layout of a named project.
//!
//! ```text
//! <root>/projects/<name>/source.cpp    user code, stored verbatim
//! <root>/projects/<name>/program[.exe] build output
//! <root>/projects/<name>/sketch.json   flowchart nodes
//! ```

pub mod sketch;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Settings;
use crate::errors::{BuildError, Result};
use crate::exec::BuildRequest;

pub use sketch::{Sketch, SketchNode};

/// Source written to a project that has never been saved.
pub const STARTER_SOURCE: &str =
    "#include <iostream>\nint main(){ std::cout << \"Hello from minibuild!\"; return 0; }\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    dir: PathBuf,
    name: String,
}

impl Project {
    /// Describe project `name` under `root`. Nothing is created on disk.
    ///
    /// Names are used as a single directory component, so empty names and
    /// names containing path separators or `..` are refused.
    pub fn new(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
        {
            return Err(BuildError::ConfigError(format!(
                "invalid project name {name:?}"
            )));
        }
        Ok(Self {
            dir: root.as_ref().join("projects").join(trimmed),
            name: trimmed.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join("source.cpp")
    }

    pub fn exe_path(&self) -> PathBuf {
        let mut name = String::from("program");
        name.push_str(std::env::consts::EXE_SUFFIX);
        self.dir.join(name)
    }

    pub fn sketch_path(&self) -> PathBuf {
        self.dir.join("sketch.json")
    }

    pub fn save_source(&self, text: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.source_path(), text)?;
        debug!(project = %self.name, bytes = text.len(), "source saved");
        Ok(())
    }

    /// The saved source, or [`STARTER_SOURCE`] if none has been saved yet.
    pub fn load_source(&self) -> Result<String> {
        match fs::read_to_string(self.source_path()) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(STARTER_SOURCE.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_sketch(&self, sketch: &Sketch) -> Result<()> {
        sketch.save(self.sketch_path())
    }

    pub fn load_sketch(&self) -> Result<Sketch> {
        Sketch::load_or_default(self.sketch_path())
    }

    /// A request that compiles this project's source into its program.
    pub fn build_request(&self, settings: &Settings, more_flags: &[String]) -> BuildRequest {
        settings.request(self.source_path(), self.exe_path(), more_flags)
    }
}
