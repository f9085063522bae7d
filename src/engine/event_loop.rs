// src/engine/event_loop.rs

//! The per-task event loop.
//!
//! Every input (control queue, file changes, watcher errors, process output,
//! process completion) is awaited in one `select!` and handled to completion
//! before the next one is taken. Stopping the previous process is awaited in
//! full before a replacement is launched, so a task never has more than one
//! live process.

use std::future;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{LogMirror, Task, TaskCommand, TaskStatus};
use crate::errors::{Result, StagError};
use crate::exec::{ProcessEvent, ProcessExit, ProcessHandle};
use crate::watch::{WatchEvent, WatchSubscription};

/// Why the loop has to stop outside the normal Quit / Error paths.
#[derive(Debug)]
enum Halt {
    /// Writing the log mirror failed; the message names the file.
    Log(String),
    /// Nobody is reading the output stream any more.
    OutputClosed,
}

type Step<T = ()> = std::result::Result<T, Halt>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

#[derive(Debug)]
enum LoopEvent {
    Control(Option<TaskCommand>),
    Watch(WatchEvent),
    Process(ProcessEvent),
}

impl Task {
    /// Run the task until it quits or fails.
    ///
    /// Non-menu tasks launch their first command immediately. The returned
    /// status is the task's status when the loop ended (`Error` after a
    /// failure). Dropping every sender of `control` acts like `Quit`.
    ///
    /// Returns `Err` if the task was started before, or if the output stream's
    /// receiver was dropped.
    pub async fn start(&mut self, mut control: mpsc::Receiver<TaskCommand>) -> Result<TaskStatus> {
        if self.started {
            return Err(StagError::AlreadyStarted(self.spec.id));
        }
        self.started = true;
        self.state.send_modify(|s| s.closed = false);

        info!(task = self.spec.id, name = %self.spec.name, "task loop started");

        let mut engine = Engine {
            task: self,
            active: None,
            log: None,
            subscription: None,
        };
        let result = engine.run(&mut control).await;
        engine.release().await;

        self.state.send_modify(|s| s.closed = true);
        let status = self.state.borrow().status;
        info!(task = self.spec.id, %status, "task loop ended");

        result.map(|()| status)
    }
}

/// Loop-local state: everything that only exists while the task runs.
struct Engine<'a> {
    task: &'a mut Task,
    active: Option<ProcessHandle>,
    log: Option<LogMirror>,
    subscription: Option<WatchSubscription>,
}

impl Engine<'_> {
    async fn run(&mut self, control: &mut mpsc::Receiver<TaskCommand>) -> Result<()> {
        match self.run_loop(control).await {
            Ok(()) => Ok(()),
            Err(Halt::Log(message)) => {
                warn!(task = self.task.spec.id, error = %message, "log mirror failed");
                self.log = None;
                self.stop_active().await;
                self.update_status(TaskStatus::Error, format!("Log error: {message}"))
                    .await
                    .map_err(|_| StagError::OutputClosed)
            }
            Err(Halt::OutputClosed) => {
                warn!(task = self.task.spec.id, "output stream closed; stopping task");
                Err(StagError::OutputClosed)
            }
        }
    }

    async fn run_loop(&mut self, control: &mut mpsc::Receiver<TaskCommand>) -> Step {
        if let Some(path) = self.task.spec.log_path.clone() {
            match LogMirror::create(&path).await {
                Ok(mirror) => self.log = Some(mirror),
                Err(err) => return Err(Halt::Log(format!("{}: {err}", path.display()))),
            }
        }

        let subscription = match self.task.watch_set.as_deref() {
            Some(paths) if !paths.is_empty() => Some(self.task.watcher.subscribe(paths)),
            _ => None,
        };
        match subscription {
            Some(Ok(sub)) => self.subscription = Some(sub),
            Some(Err(err)) => {
                self.update_status(TaskStatus::Error, watcher_error_text(&err))
                    .await?;
                return Ok(());
            }
            None => {}
        }

        if !self.task.spec.is_menu_task {
            self.schedule(0).await?;
        }

        loop {
            let event = tokio::select! {
                cmd = control.recv() => LoopEvent::Control(cmd),
                Some(evt) = next_watch_event(&mut self.subscription) => LoopEvent::Watch(evt),
                evt = next_process_event(&mut self.active) => LoopEvent::Process(evt),
            };

            debug!(task = self.task.spec.id, ?event, "task loop event");

            if self.handle(event).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    async fn handle(&mut self, event: LoopEvent) -> Step<Flow> {
        match event {
            LoopEvent::Control(None) | LoopEvent::Control(Some(TaskCommand::Quit)) => {
                info!(task = self.task.spec.id, "quit requested");
                self.release().await;
                // Nothing is emitted after Quit; the snapshot still records
                // that no command is running any more.
                self.task.state.send_modify(|s| {
                    s.status = TaskStatus::Idle;
                    s.subtask_index = None;
                });
                Ok(Flow::Exit)
            }
            LoopEvent::Control(Some(TaskCommand::Start)) => {
                self.schedule(0).await?;
                Ok(Flow::Continue)
            }
            LoopEvent::Watch(WatchEvent::Changed(path)) => {
                info!(task = self.task.spec.id, path = %path.display(), "watched file changed");
                self.update_status(
                    TaskStatus::Restarting,
                    format!("Changed file: {}, restarting ...", path.display()),
                )
                .await?;
                self.schedule(0).await?;
                Ok(Flow::Continue)
            }
            LoopEvent::Watch(WatchEvent::Error(text)) => {
                warn!(task = self.task.spec.id, error = %text, "watcher error");
                self.update_status(TaskStatus::Error, format!("Watcher error: {text}"))
                    .await?;
                self.release().await;
                Ok(Flow::Exit)
            }
            LoopEvent::Process(ProcessEvent::Stdout(line))
            | LoopEvent::Process(ProcessEvent::Stderr(line)) => {
                self.emit(format!("{line}\n")).await?;
                Ok(Flow::Continue)
            }
            LoopEvent::Process(ProcessEvent::Exited(exit)) => self.on_exit(exit).await,
        }
    }

    async fn on_exit(&mut self, exit: ProcessExit) -> Step<Flow> {
        if let Some(finished) = self.active.take() {
            finished.stop().await;
        }

        match exit {
            ProcessExit::Code(0) => {
                self.update_status(TaskStatus::Finished, "Finished.".to_string())
                    .await?;

                let next = self.task.state.borrow().subtask_index.map_or(0, |i| i + 1);
                if next >= self.task.spec.commands.len() {
                    debug!(task = self.task.spec.id, "command sequence complete; idle");
                    self.task.state.send_modify(|s| {
                        s.subtask_index = None;
                        s.status = TaskStatus::Idle;
                    });
                } else {
                    self.schedule(next).await?;
                }
                Ok(Flow::Continue)
            }
            ProcessExit::Code(code) => {
                self.update_status(TaskStatus::Error, format!("Exited with code {code}"))
                    .await?;
                Ok(Flow::Exit)
            }
            ProcessExit::Failed(cause) => {
                self.update_status(TaskStatus::Error, format!("Error: {cause}"))
                    .await?;
                Ok(Flow::Exit)
            }
        }
    }

    /// Stop whatever runs and launch command `index`.
    async fn schedule(&mut self, index: usize) -> Step {
        self.stop_active().await;

        let command = self.task.spec.commands[index].clone();
        let argv = self.task.spec.template.render(&command);
        info!(task = self.task.spec.id, index, cmd = %command, "launching command");

        self.active = Some(self.task.launcher.launch(&argv));
        self.task.state.send_modify(|s| s.subtask_index = Some(index));
        self.update_status(TaskStatus::Running, format!("Running: {command}"))
            .await
    }

    async fn stop_active(&mut self) {
        if let Some(previous) = self.active.take() {
            debug!(task = self.task.spec.id, "stopping active process");
            previous.stop().await;
        }
    }

    /// Stop the process and drop the watch subscription.
    async fn release(&mut self) {
        self.stop_active().await;
        self.subscription = None;
    }

    async fn update_status(&mut self, status: TaskStatus, text: String) -> Step {
        self.task.state.send_modify(|s| {
            s.status = status;
            s.status_long = text.clone();
            if status == TaskStatus::Error {
                s.subtask_index = None;
            }
        });
        self.emit(format!("{text}\n")).await
    }

    /// Mirror `chunk` to the log, then forward it to the output stream.
    async fn emit(&mut self, chunk: String) -> Step {
        if let Some(log) = self.log.as_mut() {
            if let Err(err) = log.write(&chunk).await {
                return Err(Halt::Log(format!("{}: {err}", log.path().display())));
            }
        }
        self.task
            .output
            .send(chunk)
            .await
            .map_err(|_| Halt::OutputClosed)
    }
}

fn watcher_error_text(err: &StagError) -> String {
    match err {
        StagError::Watch(_) => err.to_string(),
        other => format!("Watcher error: {other}"),
    }
}

async fn next_watch_event(subscription: &mut Option<WatchSubscription>) -> Option<WatchEvent> {
    match subscription {
        Some(sub) => sub.next_event().await,
        None => future::pending().await,
    }
}

async fn next_process_event(active: &mut Option<ProcessHandle>) -> ProcessEvent {
    match active {
        Some(handle) => match handle.next_event().await {
            Some(event) => event,
            None => ProcessEvent::Exited(ProcessExit::Failed(
                "process supervisor ended without reporting an exit".to_string(),
            )),
        },
        None => future::pending().await,
    }
}
