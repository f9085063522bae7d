// src/engine/mod.rs

//! Task engine for stag.
//!
//! One [`Task`] per configured task. Its event loop (in [`event_loop`]) is the
//! only code that mutates the task: control commands, file-change events and
//! process output all funnel into a single "what runs next" decision, so no
//! locking is needed.
//!
//! Outside readers observe a task through:
//! - its output stream (status lines and forwarded process output),
//! - its optional log mirror file,
//! - read-only [`TaskState`] snapshots from [`Task::subscribe`].

use std::fmt;

/// Stable task identity, assigned at configuration load.
pub type TaskId = usize;

/// Capacity of a task's control queue.
pub const CONTROL_QUEUE_CAPACITY: usize = 10;

/// Commands a driver can send to a running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCommand {
    /// Stop any running process and terminate the loop.
    Quit,
    /// Run the command sequence from the start, restarting it if running.
    Start,
}

/// Observable lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    Running,
    Restarting,
    Finished,
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Running => "running",
            TaskStatus::Restarting => "restarting",
            TaskStatus::Finished => "finished",
            TaskStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot of a task's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub status: TaskStatus,
    /// Human-readable description of `status` (the last status line).
    pub status_long: String,
    /// Index of the running command; `None` when no command is running.
    pub subtask_index: Option<usize>,
    /// True before the loop starts and after it terminates.
    pub closed: bool,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            status: TaskStatus::Idle,
            status_long: String::new(),
            subtask_index: None,
            closed: true,
        }
    }
}

pub mod event_loop;
pub mod log_mirror;
pub mod task;

pub use log_mirror::LogMirror;
pub use task::{Task, TaskSpec};
