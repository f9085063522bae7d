// src/config/mod.rs

//! Configuration loading and validation for stag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or a mock filesystem (`loader.rs`).
//! - Validate it and assign task ids (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_PATH, load_and_validate, load_and_validate_with, load_with};
pub use model::{
    ConfigFile, DEFAULT_STORE_SIZE, MenuTask, RawConfigFile, RawMenuTask, RawWatchTask, RunSpec,
    StoreSize, WatchTask,
};
pub use validate::validate_config;
