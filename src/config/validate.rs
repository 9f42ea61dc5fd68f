// src/config/validate.rs

use crate::config::model::{RawSettings, Settings};
use crate::errors::{BuildError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = BuildError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_raw_settings(&raw)?;
        Ok(Settings::new_unchecked(raw))
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    validate_toolchain(raw)?;
    validate_std(raw)?;
    validate_flags(raw)?;
    Ok(())
}

fn validate_toolchain(raw: &RawSettings) -> Result<()> {
    if raw.mingw_path.as_os_str().is_empty() {
        return Err(BuildError::ConfigError(
            "mingw_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_std(raw: &RawSettings) -> Result<()> {
    if raw.std.is_empty() || raw.std.chars().any(char::is_whitespace) {
        return Err(BuildError::ConfigError(format!(
            "std must be a single word like \"c++17\" (got {:?})",
            raw.std
        )));
    }
    Ok(())
}

fn validate_flags(raw: &RawSettings) -> Result<()> {
    if let Some(idx) = raw.extra_flags.iter().position(|f| f.trim().is_empty()) {
        return Err(BuildError::ConfigError(format!(
            "extra_flags[{idx}] is empty"
        )));
    }
    Ok(())
}
