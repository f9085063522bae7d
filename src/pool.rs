// src/pool.rs

//! Engine pool: one running [`Task`] per configured task.
//!
//! The pool builds every task (resolving watch sets) before starting any of
//! them, so a configuration error never leaves half a pool running. Each task
//! then runs on its own tokio task with its own control queue and output
//! stream; tasks share nothing.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::{CONTROL_QUEUE_CAPACITY, Task, TaskCommand, TaskId, TaskState, TaskStatus};
use crate::errors::{Result, StagError};
use crate::exec::{ProcessLauncher, TokioLauncher};
use crate::fs::FileSystem;
use crate::watch::{ChangeWatcher, NotifyWatcher};

/// Capacity of each task's output stream. A slow reader back-pressures the
/// task's loop.
pub const OUTPUT_CHANNEL_CAPACITY: usize = 64;

/// What happened to a command handed to [`TaskPool::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    UnknownTask,
    /// The task has not caught up with earlier commands.
    QueueFull,
    Exited,
}

struct PoolEntry {
    label: String,
    menu_key: Option<String>,
    control: mpsc::Sender<TaskCommand>,
    state: watch::Receiver<TaskState>,
    output: Option<mpsc::Receiver<String>>,
    handle: JoinHandle<Result<TaskStatus>>,
}

pub struct TaskPool {
    entries: BTreeMap<TaskId, PoolEntry>,
}

impl fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPool")
            .field("tasks", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TaskPool {
    /// Start every configured task with real processes and file watching.
    pub fn spawn(cfg: &ConfigFile, fs: &dyn FileSystem) -> Result<Self> {
        Self::spawn_with(
            cfg,
            fs,
            |_| Box::new(TokioLauncher::new()),
            |_| Box::new(NotifyWatcher::new()),
        )
    }

    /// Start every configured task with the given per-task backends.
    pub fn spawn_with<L, W>(
        cfg: &ConfigFile,
        fs: &dyn FileSystem,
        mut make_launcher: L,
        mut make_watcher: W,
    ) -> Result<Self>
    where
        L: FnMut(TaskId) -> Box<dyn ProcessLauncher>,
        W: FnMut(TaskId) -> Box<dyn ChangeWatcher>,
    {
        let mut prepared = Vec::with_capacity(cfg.task_count());

        for wt in &cfg.watch {
            let (out_tx, out_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
            let mut task = Task::with_backends(
                wt.spec(&cfg.template),
                out_tx,
                make_launcher(wt.id),
                make_watcher(wt.id),
            )?;
            task.watch(fs, &wt.files, &wt.exclude)?;
            prepared.push((task, out_rx, None));
        }

        for mt in &cfg.menu {
            let (out_tx, out_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
            let task = Task::with_backends(
                mt.spec(&cfg.template),
                out_tx,
                make_launcher(mt.id),
                make_watcher(mt.id),
            )?;
            prepared.push((task, out_rx, Some(mt.key.clone())));
        }

        let mut entries = BTreeMap::new();
        for (mut task, out_rx, menu_key) in prepared {
            let id = task.id();
            let label = task.name().to_string();
            let state = task.subscribe();
            let (control_tx, control_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);

            let handle = tokio::spawn(async move { task.start(control_rx).await });
            debug!(task = id, label = %label, "task spawned");

            entries.insert(
                id,
                PoolEntry {
                    label,
                    menu_key,
                    control: control_tx,
                    state,
                    output: Some(out_rx),
                    handle,
                },
            );
        }

        info!(tasks = entries.len(), "task pool started");
        Ok(Self { entries })
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.entries.keys().copied()
    }

    pub fn label(&self, id: TaskId) -> Option<&str> {
        self.entries.get(&id).map(|e| e.label.as_str())
    }

    /// Latest state snapshot of a task.
    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.entries.get(&id).map(|e| e.state.borrow().clone())
    }

    /// A receiver of state changes for a task.
    pub fn subscribe(&self, id: TaskId) -> Option<watch::Receiver<TaskState>> {
        self.entries.get(&id).map(|e| e.state.clone())
    }

    /// Hand out every task's output stream (once).
    ///
    /// The streams must be drained for as long as the tasks run; an undrained
    /// stream eventually blocks its task, including its handling of `Quit`.
    pub fn take_outputs(&mut self) -> Vec<(TaskId, mpsc::Receiver<String>)> {
        self.entries
            .iter_mut()
            .filter_map(|(id, e)| e.output.take().map(|rx| (*id, rx)))
            .collect()
    }

    /// Queue a command for one task without waiting.
    ///
    /// A full control queue drops the command rather than blocking the
    /// caller, which may be the only reader of the task's output.
    pub fn send(&self, id: TaskId, cmd: TaskCommand) -> Delivery {
        let Some(entry) = self.entries.get(&id) else {
            warn!(task = id, "command for unknown task");
            return Delivery::UnknownTask;
        };
        match entry.control.try_send(cmd) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                warn!(task = id, ?cmd, "control queue full; command dropped");
                Delivery::QueueFull
            }
            Err(TrySendError::Closed(_)) => {
                debug!(task = id, ?cmd, "task already exited; command dropped");
                Delivery::Exited
            }
        }
    }

    /// Start the menu task bound to `key`. `None` if no menu task uses it.
    pub fn start_menu(&self, key: &str) -> Option<(TaskId, Delivery)> {
        let id = self
            .entries
            .iter()
            .find(|(_, e)| e.menu_key.as_deref() == Some(key))
            .map(|(id, _)| *id)?;
        Some((id, self.send(id, TaskCommand::Start)))
    }

    /// Ask every task to quit and wait for all of them.
    pub async fn shutdown(self) -> Vec<(TaskId, Result<TaskStatus>)> {
        for (id, entry) in &self.entries {
            if entry.control.send(TaskCommand::Quit).await.is_err() {
                debug!(task = id, "task already exited before shutdown");
            }
        }

        let mut results = Vec::with_capacity(self.entries.len());
        for (id, entry) in self.entries {
            let result = match entry.handle.await {
                Ok(result) => result,
                Err(err) => Err(StagError::Other(anyhow!("task {id} panicked: {err}"))),
            };
            results.push((id, result));
        }

        info!("task pool shut down");
        results
    }
}
