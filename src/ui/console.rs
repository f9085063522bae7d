// src/ui/console.rs

//! Line-oriented console: merges every task's output onto one stream and
//! reads short commands from stdin.

use std::collections::BTreeMap;
use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{TaskCommand, TaskId, TaskStatus};
use crate::errors::Result;
use crate::pool::{Delivery, OUTPUT_CHANNEL_CAPACITY, TaskPool};
use crate::ui::buffer::OutputBuffer;
use crate::ui::sanitize::sanitize_ansi;

/// A command typed on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Quit,
    Restart(TaskId),
    View(TaskId),
    Help,
    Unknown(String),
}

/// Parse one input line. Blank lines yield `None`.
///
/// Menu keys are matched by the caller before this runs, so a menu task bound
/// to `q` shadows the quit command.
pub fn parse_input(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let arg = parts.next();

    let parsed = match (head, arg) {
        ("q" | "quit", None) => ConsoleInput::Quit,
        ("?" | "help", None) => ConsoleInput::Help,
        ("r", Some(id)) => match id.parse() {
            Ok(id) => ConsoleInput::Restart(id),
            Err(_) => ConsoleInput::Unknown(line.to_string()),
        },
        ("v", Some(id)) => match id.parse() {
            Ok(id) => ConsoleInput::View(id),
            Err(_) => ConsoleInput::Unknown(line.to_string()),
        },
        _ => ConsoleInput::Unknown(line.to_string()),
    };
    Some(parsed)
}

const HELP: &str = "commands: <menu key> | r <id> (restart) | v <id> (replay output) | q (quit)\n";

/// Per-task display state: label, retained output and line position.
#[derive(Debug)]
pub struct Console {
    labels: BTreeMap<TaskId, String>,
    buffers: BTreeMap<TaskId, OutputBuffer>,
    at_line_start: BTreeMap<TaskId, bool>,
    store: usize,
}

impl Console {
    pub fn new(labels: BTreeMap<TaskId, String>, store: usize) -> Self {
        Self {
            labels,
            buffers: BTreeMap::new(),
            at_line_start: BTreeMap::new(),
            store,
        }
    }

    /// Sanitise and retain `chunk`, returning it with every line prefixed by
    /// `[label] `.
    ///
    /// Chunks may end mid-line; the next chunk for the same task then
    /// continues that line without a second prefix.
    pub fn record(&mut self, id: TaskId, chunk: &str) -> String {
        let clean = sanitize_ansi(chunk);
        self.buffers
            .entry(id)
            .or_insert_with(|| OutputBuffer::with_capacity(self.store))
            .push(&clean);

        let prefix = format!("[{}] ", self.label(id));
        let line_start = self.at_line_start.entry(id).or_insert(true);

        let mut out = String::with_capacity(clean.len() + prefix.len());
        for piece in clean.split_inclusive('\n') {
            if *line_start {
                out.push_str(&prefix);
            }
            out.push_str(piece);
            *line_start = piece.ends_with('\n');
        }
        out
    }

    /// Output retained for `id`, oldest first.
    pub fn retained(&self, id: TaskId) -> &str {
        self.buffers.get(&id).map(|b| b.as_str()).unwrap_or_default()
    }

    pub fn label(&self, id: TaskId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("task-{id}"))
    }

    /// Drive the pool until every task has exited, the input asks to quit or
    /// `interrupt` resolves. Shuts the pool down before returning.
    pub async fn run<R, W, F>(
        mut self,
        mut pool: TaskPool,
        input: R,
        out: &mut W,
        interrupt: F,
    ) -> Result<Vec<(TaskId, Result<TaskStatus>)>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let (merged_tx, mut merged_rx) = mpsc::channel::<(TaskId, String)>(OUTPUT_CHANNEL_CAPACITY);
        for (id, mut rx) in pool.take_outputs() {
            let tx = merged_tx.clone();
            tokio::spawn(async move {
                while let Some(chunk) = rx.recv().await {
                    if tx.send((id, chunk)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(merged_tx);

        let mut lines = input.lines();
        let mut input_open = true;
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                msg = merged_rx.recv() => match msg {
                    Some((id, chunk)) => {
                        let text = self.record(id, &chunk);
                        out.write_all(text.as_bytes()).await?;
                        out.flush().await?;
                    }
                    None => {
                        info!("all tasks exited");
                        break;
                    }
                },
                line = lines.next_line(), if input_open => match line {
                    Ok(Some(line)) => {
                        if let Some((id, delivery)) = pool.start_menu(line.trim()) {
                            report_delivery(out, id, delivery).await?;
                            continue;
                        }
                        match parse_input(&line) {
                            None => {}
                            Some(ConsoleInput::Quit) => {
                                info!("quit requested");
                                break;
                            }
                            Some(ConsoleInput::Restart(id)) => {
                                let delivery = pool.send(id, TaskCommand::Start);
                                report_delivery(out, id, delivery).await?;
                            }
                            Some(ConsoleInput::View(id)) => {
                                let text = self.retained(id).to_string();
                                out.write_all(text.as_bytes()).await?;
                                if !text.is_empty() && !text.ends_with('\n') {
                                    out.write_all(b"\n").await?;
                                }
                            }
                            Some(ConsoleInput::Help) => out.write_all(HELP.as_bytes()).await?,
                            Some(ConsoleInput::Unknown(text)) => {
                                debug!(input = %text, "unrecognised console input");
                                out.write_all(format!("unknown command: {text}\n").as_bytes()).await?;
                            }
                        }
                        out.flush().await?;
                    }
                    Ok(None) => {
                        debug!("console input closed");
                        input_open = false;
                    }
                    Err(err) => {
                        warn!(error = %err, "reading console input failed");
                        input_open = false;
                    }
                },
                _ = &mut interrupt => {
                    info!("interrupted");
                    break;
                }
            }
        }

        // Keep draining while tasks quit; a full output stream would block them.
        let shutdown = pool.shutdown();
        tokio::pin!(shutdown);
        let results = loop {
            tokio::select! {
                results = &mut shutdown => break results,
                Some((id, chunk)) = merged_rx.recv() => {
                    let text = self.record(id, &chunk);
                    out.write_all(text.as_bytes()).await?;
                }
            }
        };
        while let Ok((id, chunk)) = merged_rx.try_recv() {
            let text = self.record(id, &chunk);
            out.write_all(text.as_bytes()).await?;
        }
        out.flush().await?;

        Ok(results)
    }
}

async fn report_delivery<W: AsyncWrite + Unpin>(
    out: &mut W,
    id: TaskId,
    delivery: Delivery,
) -> Result<()> {
    let text = match delivery {
        Delivery::Queued => return Ok(()),
        Delivery::QueueFull => format!("task {id} is busy; command dropped\n"),
        Delivery::UnknownTask | Delivery::Exited => format!("no running task {id}\n"),
    };
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
