// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{RawSettings, Settings};
use crate::errors::{BuildError, Result};

/// Read a settings file and return the raw, unvalidated `RawSettings`.
///
/// This only performs JSON deserialization. Use [`load_or_default`] for the
/// validated settings the rest of the application works with.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        BuildError::ConfigError(format!("parsing settings {}: {e}", path.display()))
    })
}

/// Load settings, falling back to defaults when the file does not exist.
///
/// A file that exists but cannot be read or parsed is a
/// [`BuildError::ConfigError`]; it is never silently replaced.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let raw = match load_from_path(path) {
        Ok(raw) => raw,
        Err(BuildError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file; using defaults");
            RawSettings::default()
        }
        Err(BuildError::IoError(e)) => {
            return Err(BuildError::ConfigError(format!(
                "reading settings {}: {e}",
                path.display()
            )));
        }
        Err(e) => return Err(e),
    };
    Settings::try_from(raw)
}

/// Write settings as pretty-printed JSON, creating parent directories.
pub fn save(path: impl AsRef<Path>, settings: &Settings) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut json = serde_json::to_string_pretty(settings.raw())?;
    json.push('\n');
    fs::write(path, json)?;
    info!(path = %path.display(), "settings saved");
    Ok(())
}

/// Default settings location: `minibuild.json` in the working directory.
///
/// `MINIBUILD_SETTINGS` overrides it.
pub fn default_settings_path() -> PathBuf {
    std::env::var_os("MINIBUILD_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("minibuild.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_or_default(dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, r#"{"mingw_path": "/usr/bin/g++", "unknown": 1}"#).unwrap();

        let settings = load_or_default(&path).unwrap();
        assert_eq!(settings.toolchain_path(), Path::new("/usr/bin/g++"));
        assert_eq!(settings.std(), "c++17");
        assert!(settings.verify_output());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_or_default(&path).unwrap_err();
        assert!(matches!(err, BuildError::ConfigError(_)));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("s.json");
        let raw = RawSettings {
            mingw_path: "/opt/gcc/bin/g++".into(),
            std: "c++20".into(),
            extra_flags: vec!["-Wall".into()],
            log_file: Some("build.log".into()),
            verify_output: false,
        };
        let settings = Settings::try_from(raw).unwrap();

        save(&path, &settings).unwrap();
        assert_eq!(load_or_default(&path).unwrap(), settings);
    }
}
