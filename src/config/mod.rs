// src/config/mod.rs

//! Persisted settings for minibuild.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Load and save the settings file (`loader.rs`).
//! - Validate raw settings into `Settings` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_settings_path, load_from_path, load_or_default, save};
pub use model::{RawSettings, Settings, default_toolchain_path};
