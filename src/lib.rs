// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pool;
pub mod ui;
pub mod watch;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::fs::{FileSystem, RealFileSystem};
use crate::pool::TaskPool;
use crate::ui::Console;
use crate::watch::resolve_watch_set;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task pool (one engine per configured task)
/// - the console (output, stdin commands, Ctrl-C)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let fs = RealFileSystem;

    if args.dry_run {
        let mut stdout = std::io::stdout().lock();
        print_dry_run(&cfg, &fs, &mut stdout)?;
        return Ok(());
    }

    let pool = TaskPool::spawn(&cfg, &fs)?;
    let labels: BTreeMap<_, _> = pool
        .ids()
        .map(|id| (id, pool.label(id).unwrap_or_default().to_string()))
        .collect();

    if !cfg.menu.is_empty() {
        let keys: Vec<&str> = cfg.menu.iter().map(|m| m.key.as_str()).collect();
        info!(?keys, "menu tasks waiting for their key");
    }

    let console = Console::new(labels, usize::try_from(cfg.store).unwrap_or(usize::MAX));
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let results = console.run(pool, stdin, &mut stdout, interrupt).await?;
    for (id, result) in results {
        match result {
            Ok(status) => debug!(task = id, %status, "task exited"),
            Err(err) => warn!(task = id, error = %err, "task ended with an error"),
        }
    }

    Ok(())
}

/// Print every task with its commands and resolved watch set.
pub fn print_dry_run(cfg: &ConfigFile, fs: &dyn FileSystem, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "stag dry-run")?;
    writeln!(out, "  format = {}", cfg.template)?;
    writeln!(out, "  store = {}B", cfg.store)?;
    writeln!(out)?;

    writeln!(out, "watch tasks ({}):", cfg.watch.len())?;
    for task in &cfg.watch {
        writeln!(out, "  - [{}] {}", task.id, task.name)?;
        for cmd in &task.commands {
            writeln!(out, "      run: {cmd}")?;
        }
        if let Some(ref log) = task.log {
            writeln!(out, "      log: {}", log.display())?;
        }
        let files = resolve_watch_set(fs, &task.files, &task.exclude)?;
        writeln!(out, "      watching {} file(s)", files.len())?;
        for file in files {
            writeln!(out, "        {file}")?;
        }
    }

    writeln!(out, "menu tasks ({}):", cfg.menu.len())?;
    for task in &cfg.menu {
        writeln!(out, "  - [{}] {} (key '{}')", task.id, task.name, task.key)?;
        for cmd in &task.commands {
            writeln!(out, "      run: {cmd}")?;
        }
        if let Some(ref log) = task.log {
            writeln!(out, "      log: {}", log.display())?;
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
