// src/project/sketch.rs

//! Flowchart sketch persistence: an ordered list of named boxes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchNode {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

/// Nodes in insertion order. Stored as a bare JSON array of
/// `{name, x, y}` records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sketch {
    pub nodes: Vec<SketchNode>,
}

impl Sketch {
    pub fn add(&mut self, name: impl Into<String>, x: f32, y: f32) {
        self.nodes.push(SketchNode {
            name: name.into(),
            x,
            y,
        });
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(path) {
            Err(crate::errors::BuildError::IoError(e))
                if e.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
