// src/exec/process.rs

//! Real process launcher built on `tokio::process`.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::backend::{
    PROCESS_EVENT_CAPACITY, ProcessEvent, ProcessExit, ProcessHandle, ProcessLauncher,
};

/// Launches commands as OS processes with piped stdout/stderr.
#[derive(Debug, Clone, Default)]
pub struct TokioLauncher;

impl TokioLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for TokioLauncher {
    fn launch(&mut self, argv: &[String]) -> ProcessHandle {
        let (event_tx, event_rx) = mpsc::channel(PROCESS_EVENT_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let argv = argv.to_vec();

        let supervisor = tokio::spawn(async move {
            supervise(argv, event_tx, cancel_rx).await;
        });

        ProcessHandle::new(event_rx, cancel_tx, supervisor)
    }
}

/// Own one child process from spawn to reaping.
///
/// - On normal exit, `Exited` is sent after both output readers reached EOF.
/// - On cancellation the whole process group is killed and **no** `Exited`
///   event is sent.
async fn supervise(
    argv: Vec<String>,
    events: mpsc::Sender<ProcessEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let Some((program, args)) = argv.split_first() else {
        let _ = events
            .send(ProcessEvent::Exited(ProcessExit::Failed(
                "empty command line".to_string(),
            )))
            .await;
        return;
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so a stop reaches everything the command forked.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(program = %program, error = %err, "failed to spawn process");
            let _ = events
                .send(ProcessEvent::Exited(ProcessExit::Failed(err.to_string())))
                .await;
            return;
        }
    };

    let pid = child.id();
    info!(pid = ?pid, program = %program, "process started");

    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, events.clone(), ProcessEvent::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, events.clone(), ProcessEvent::Stderr));
    }
    let abort_handles: Vec<_> = readers.iter().map(JoinHandle::abort_handle).collect();

    // Either the process exits on its own, or the engine asks us to stop it.
    // A dropped cancel sender counts as a stop request.
    let exit = tokio::select! {
        exit = wait_for_exit(&mut child, readers) => Some(exit),
        _ = &mut cancel_rx => None,
    };

    match exit {
        Some(exit) => {
            info!(program = %program, ?exit, "process exited");
            let _ = events.send(ProcessEvent::Exited(exit)).await;
        }
        None => {
            info!(program = %program, "stop requested; killing process group");
            kill_group(pid);
            // Reap the direct child.
            if let Err(err) = child.kill().await {
                warn!(program = %program, error = %err, "failed to kill process");
            }
            for handle in abort_handles {
                handle.abort();
            }
        }
    }
}

/// SIGKILL the process group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(raw) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(pid = raw, error = %err, "failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

async fn wait_for_exit(child: &mut Child, readers: Vec<JoinHandle<()>>) -> ProcessExit {
    for reader in readers {
        if let Err(err) = reader.await {
            debug!(error = %err, "output reader ended abnormally");
        }
    }

    match child.wait().await {
        Ok(status) => ProcessExit::Code(status.code().unwrap_or(-1)),
        Err(err) => ProcessExit::Failed(err.to_string()),
    }
}

/// Forward a pipe line by line (without the trailing newline), decoding
/// lossily so binary output cannot stall the reader.
fn spawn_reader<R>(
    pipe: R,
    events: mpsc::Sender<ProcessEvent>,
    wrap: fn(String) -> ProcessEvent,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if events.send(wrap(line)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(error = %err, "error reading process output");
                    break;
                }
            }
        }
    })
}
