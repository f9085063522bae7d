use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stag::exec::backend::PROCESS_EVENT_CAPACITY;
use stag::exec::{ProcessEvent, ProcessExit, ProcessHandle, ProcessLauncher};
use tokio::sync::{mpsc, oneshot};

/// How a scripted process ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Exit(i32),
    /// Reported as `ProcessExit::Failed`, like a spawn error.
    SpawnFailure(String),
    /// Never exits on its own; only `stop` ends it.
    Hang,
}

/// What a fake process prints and how it ends.
#[derive(Debug, Clone)]
pub struct Script {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub outcome: Outcome,
    pub delay: Option<Duration>,
}

impl Script {
    pub fn exit(code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: Outcome::Exit(code),
            delay: None,
        }
    }

    pub fn hang() -> Self {
        Self {
            outcome: Outcome::Hang,
            ..Self::exit(0)
        }
    }

    pub fn spawn_failure(cause: &str) -> Self {
        Self {
            outcome: Outcome::SpawnFailure(cause.to_string()),
            ..Self::exit(0)
        }
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.stdout.push(line.to_string());
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.stderr.push(line.to_string());
        self
    }

    /// Wait this long before producing any output.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::exit(0)
    }
}

/// Launcher that plays back scripts instead of spawning processes.
///
/// Scripts are looked up by command text, i.e. the last element of the
/// rendered argv (`bash -c <command>`). Unknown commands exit 0 silently.
/// Clones share all state, so a test can keep one clone for assertions.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    launched: Arc<Mutex<Vec<Vec<String>>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, command: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(command.to_string(), script);
        self
    }

    /// Every argv launched so far, in order.
    pub fn launched(&self) -> Vec<Vec<String>> {
        self.launched.lock().unwrap().clone()
    }

    /// Command text of every launch so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.launched()
            .into_iter()
            .filter_map(|argv| argv.last().cloned())
            .collect()
    }

    /// Processes started and not yet finished or stopped.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live processes observed.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn lookup(&self, argv: &[String]) -> Script {
        argv.last()
            .and_then(|cmd| self.scripts.lock().unwrap().get(cmd).cloned())
            .unwrap_or_default()
    }
}

struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn enter(active: Arc<AtomicUsize>, max_active: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        max_active.fetch_max(now, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&mut self, argv: &[String]) -> ProcessHandle {
        self.launched.lock().unwrap().push(argv.to_vec());
        let script = self.lookup(argv);

        let (tx, rx) = mpsc::channel(PROCESS_EVENT_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let guard = ActiveGuard::enter(Arc::clone(&self.active), &self.max_active);

        let supervisor = tokio::spawn(async move {
            let _guard = guard;
            tokio::select! {
                _ = play(script, tx) => {}
                _ = cancel_rx => {}
            }
        });

        ProcessHandle::new(rx, cancel_tx, supervisor)
    }
}

async fn play(script: Script, tx: mpsc::Sender<ProcessEvent>) {
    if let Some(delay) = script.delay {
        tokio::time::sleep(delay).await;
    }
    for line in script.stdout {
        if tx.send(ProcessEvent::Stdout(line)).await.is_err() {
            return;
        }
    }
    for line in script.stderr {
        if tx.send(ProcessEvent::Stderr(line)).await.is_err() {
            return;
        }
    }

    let exit = match script.outcome {
        Outcome::Exit(code) => ProcessExit::Code(code),
        Outcome::SpawnFailure(cause) => ProcessExit::Failed(cause),
        Outcome::Hang => std::future::pending().await,
    };
    let _ = tx.send(ProcessEvent::Exited(exit)).await;
}
