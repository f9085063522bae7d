// src/engine/task.rs

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::engine::{TaskId, TaskState};
use crate::errors::{Result, StagError};
use crate::exec::{CommandTemplate, ProcessLauncher, TokioLauncher};
use crate::fs::FileSystem;
use crate::watch::{ChangeWatcher, NotifyWatcher, resolve_watch_set};

/// Immutable configuration of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: TaskId,
    /// Label used in logs and by the console.
    pub name: String,
    /// Commands run in order; must be non-empty.
    pub commands: Vec<String>,
    pub template: CommandTemplate,
    /// Raw mirror of all emitted text, if set.
    pub log_path: Option<PathBuf>,
    /// Menu tasks wait for an explicit `Start` (or a file change).
    pub is_menu_task: bool,
}

/// A supervised command sequence.
///
/// Construct with [`Task::new`], optionally call [`Task::watch`] once, then
/// run [`Task::start`] on its own tokio task: it returns only when the
/// task's loop terminates.
pub struct Task {
    pub(crate) spec: TaskSpec,
    pub(crate) watch_set: Option<Vec<String>>,
    pub(crate) output: mpsc::Sender<String>,
    pub(crate) state: watch::Sender<TaskState>,
    pub(crate) launcher: Box<dyn ProcessLauncher>,
    pub(crate) watcher: Box<dyn ChangeWatcher>,
    pub(crate) started: bool,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("spec", &self.spec)
            .field("watch_set", &self.watch_set)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Task {
    /// Build a task that runs real processes and watches the real filesystem.
    pub fn new(spec: TaskSpec, output: mpsc::Sender<String>) -> Result<Self> {
        Self::with_backends(
            spec,
            output,
            Box::new(TokioLauncher::new()),
            Box::new(NotifyWatcher::new()),
        )
    }

    pub fn with_backends(
        spec: TaskSpec,
        output: mpsc::Sender<String>,
        launcher: Box<dyn ProcessLauncher>,
        watcher: Box<dyn ChangeWatcher>,
    ) -> Result<Self> {
        if spec.commands.is_empty() {
            return Err(StagError::Config(format!(
                "task {} ({}) has no commands",
                spec.id, spec.name
            )));
        }
        if let Some(pos) = spec.commands.iter().position(|c| c.trim().is_empty()) {
            return Err(StagError::Config(format!(
                "task {} ({}) has an empty command at position {pos}",
                spec.id, spec.name
            )));
        }

        let (state, _) = watch::channel(TaskState::default());
        let mut task = Self {
            spec,
            watch_set: None,
            output,
            state,
            launcher,
            watcher,
            started: false,
        };
        task.init();
        Ok(task)
    }

    /// Reset to the initial idle, closed state with no watch set.
    pub fn init(&mut self) {
        self.watch_set = None;
        self.state.send_replace(TaskState::default());
    }

    /// Resolve `includes` minus `excludes` into this task's watch set.
    ///
    /// May be called at most once, before [`Task::start`]. An empty result
    /// means the task is never triggered by file changes.
    pub fn watch<S: AsRef<str>>(
        &mut self,
        fs: &dyn FileSystem,
        includes: &[S],
        excludes: &[S],
    ) -> Result<()> {
        if self.started || self.watch_set.is_some() {
            return Err(StagError::Config(format!(
                "watch set of task {} ({}) may only be resolved once, before start",
                self.spec.id, self.spec.name
            )));
        }

        let files = resolve_watch_set(fs, includes, excludes)?;
        info!(
            task = self.spec.id,
            name = %self.spec.name,
            files = files.len(),
            "watch set resolved"
        );
        self.watch_set = Some(files);
        Ok(())
    }

    pub fn id(&self) -> TaskId {
        self.spec.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn commands(&self) -> &[String] {
        &self.spec.commands
    }

    pub fn is_menu_task(&self) -> bool {
        self.spec.is_menu_task
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.spec.log_path.as_deref()
    }

    pub fn watch_set(&self) -> Option<&[String]> {
        self.watch_set.as_deref()
    }

    /// Current state snapshot.
    pub fn state(&self) -> TaskState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every state change made by the task's loop.
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.state.subscribe()
    }
}
