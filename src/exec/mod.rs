// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running a task's commands and
//! streaming their output back to the task engine.
//!
//! - [`template`] turns a command string into an argv via the task's
//!   `CommandTemplate`.
//! - [`backend`] provides the `ProcessLauncher` trait and the `ProcessHandle`
//!   value the engine owns for its single active process.
//! - [`process`] is the production launcher, built on `tokio::process`.

pub mod backend;
pub mod process;
pub mod template;

pub use backend::{ProcessEvent, ProcessExit, ProcessHandle, ProcessLauncher};
pub use process::TokioLauncher;
pub use template::{CommandTemplate, DEFAULT_TEMPLATE, PLACEHOLDER};
