// src/errors.rs

//! Crate-wide error type.
//!
//! Configuration problems and watch-set resolution failures are returned as
//! `StagError`. Failures while a task is running (non-zero exits, spawn
//! failures, watcher errors, log mirror writes) are not errors at this level:
//! the engine reports them on the task's output stream and stops the task.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("output stream closed by its consumer")]
    OutputClosed,

    #[error("task {0} was already started")]
    AlreadyStarted(usize),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<notify::Error> for StagError {
    fn from(err: notify::Error) -> Self {
        StagError::Watch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StagError>;
