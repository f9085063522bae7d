#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use stag::engine::{CONTROL_QUEUE_CAPACITY, Task, TaskCommand, TaskSpec, TaskState, TaskStatus};
use stag::errors::Result;
use stag::fs::mock::MockFileSystem;

pub use stag_test_utils::builders;
pub use stag_test_utils::{ChannelWatcher, FakeLauncher, Script, init_tracing, with_timeout};

/// A task running on its own tokio task, plus every handle a test needs.
pub struct Harness {
    pub control: mpsc::Sender<TaskCommand>,
    pub output: mpsc::Receiver<String>,
    pub state: watch::Receiver<TaskState>,
    pub handle: JoinHandle<Result<TaskStatus>>,
}

impl Harness {
    /// Next chunk on the output stream, or `None` once the task is gone.
    pub async fn next(&mut self) -> Option<String> {
        self.output.recv().await
    }

    /// Read chunks until one equals `line`, returning everything read.
    pub async fn read_until(&mut self, line: &str) -> Vec<String> {
        let mut seen = Vec::new();
        while let Some(chunk) = self.output.recv().await {
            let done = chunk == line;
            seen.push(chunk);
            if done {
                return seen;
            }
        }
        panic!("output closed before {line:?}; saw {seen:?}");
    }

    /// Everything left on the output stream until the task drops it.
    pub async fn drain(&mut self) -> Vec<String> {
        let mut rest = Vec::new();
        while let Some(chunk) = self.output.recv().await {
            rest.push(chunk);
        }
        rest
    }

    pub async fn wait_state<F>(&mut self, pred: F) -> TaskState
    where
        F: FnMut(&TaskState) -> bool,
    {
        self.state
            .wait_for(pred)
            .await
            .expect("task state channel closed")
            .clone()
    }

    pub async fn send(&self, cmd: TaskCommand) {
        self.control.send(cmd).await.expect("task loop gone");
    }

    /// Quit and return the task's final status.
    pub async fn quit(self) -> Result<TaskStatus> {
        let _ = self.control.send(TaskCommand::Quit).await;
        self.handle.await.expect("task panicked")
    }

    pub async fn join(self) -> Result<TaskStatus> {
        self.handle.await.expect("task panicked")
    }
}

/// Spawn `spec` with fake backends and no watch set.
pub fn spawn_task(spec: TaskSpec, launcher: &FakeLauncher) -> Harness {
    spawn_watching(spec, launcher, &ChannelWatcher::new(), &[])
}

/// Spawn `spec` watching `patterns` resolved against a mock tree holding
/// `src/main.rs` and `src/lib.rs`.
pub fn spawn_watching(
    spec: TaskSpec,
    launcher: &FakeLauncher,
    watcher: &ChannelWatcher,
    patterns: &[&str],
) -> Harness {
    let (out_tx, output) = mpsc::channel(64);
    let mut task = Task::with_backends(
        spec,
        out_tx,
        Box::new(launcher.clone()),
        Box::new(watcher.clone()),
    )
    .expect("valid task spec");

    if !patterns.is_empty() {
        let fs = MockFileSystem::new();
        fs.add_file("src/main.rs", "fn main() {}");
        fs.add_file("src/lib.rs", "");
        let none: &[&str] = &[];
        task.watch(&fs, patterns, none).expect("watch set resolves");
    }

    let state = task.subscribe();
    let (control, control_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
    let handle = tokio::spawn(async move { task.start(control_rx).await });

    Harness {
        control,
        output,
        state,
        handle,
    }
}

/// Give spawned tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
