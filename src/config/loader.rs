// src/config/loader.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::validate::validate_config;
use crate::errors::{Result, StagError};
use crate::fs::{FileSystem, RealFileSystem};

/// Config file looked up when `-c` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "stag.toml";

/// Read a configuration file through `fs` and return the raw config.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_with(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path).map_err(|e| {
        StagError::Config(format!("reading config file at {:?}: {e}", path))
    })?;

    Ok(toml::from_str(&contents)?)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_and_validate_with(&RealFileSystem, path.as_ref())
}

pub fn load_and_validate_with(fs: &dyn FileSystem, path: &Path) -> Result<ConfigFile> {
    let raw = load_with(fs, path)?;
    validate_config(raw)
}
