// src/exec/backend.rs

//! Pluggable process-launching abstraction.
//!
//! The task engine talks to a `ProcessLauncher` instead of spawning OS
//! processes itself. Production code uses [`TokioLauncher`]; tests provide a
//! launcher that scripts output and exit codes without spawning anything.
//!
//! Whatever the launcher, a running process is represented by a plain
//! [`ProcessHandle`] value: one event channel plus a way to stop the process
//! and wait until it is fully gone.
//!
//! [`TokioLauncher`]: super::process::TokioLauncher

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Capacity of the per-process event channel.
pub const PROCESS_EVENT_CAPACITY: usize = 64;

/// How a process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process ran and exited with this code (`-1` if killed by a signal).
    Code(i32),
    /// The process could not be spawned or waited on.
    Failed(String),
}

/// Output and completion of a running process.
///
/// `Stdout` and `Stderr` each arrive in the order the process wrote them, with
/// no ordering between the two. `Exited` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    Exited(ProcessExit),
}

/// Trait abstracting how command processes are started.
pub trait ProcessLauncher: Send {
    /// Start `argv[0]` with the remaining arguments.
    ///
    /// This never fails synchronously: spawn failures are reported as
    /// `ProcessEvent::Exited(ProcessExit::Failed(..))` on the handle.
    fn launch(&mut self, argv: &[String]) -> ProcessHandle;
}

/// Owned handle to one running process.
pub struct ProcessHandle {
    events: mpsc::Receiver<ProcessEvent>,
    cancel: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<()>,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("finished", &self.supervisor.is_finished())
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    /// Wrap a supervisor task.
    ///
    /// The supervisor owns the process, forwards its output on `events`, and
    /// must kill the process and return once `cancel` fires (or its sender is
    /// dropped).
    pub fn new(
        events: mpsc::Receiver<ProcessEvent>,
        cancel: oneshot::Sender<()>,
        supervisor: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            cancel: Some(cancel),
            supervisor,
        }
    }

    /// Next output or completion event. `None` once the supervisor is gone.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }

    /// Kill the process (if still running) and wait until it has been reaped.
    ///
    /// Events still buffered on the handle are discarded.
    pub async fn stop(mut self) {
        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!("process supervisor already finished before stop");
            }
        }
        self.events.close();
        if let Err(err) = self.supervisor.await {
            debug!(error = %err, "process supervisor ended abnormally");
        }
    }
}
