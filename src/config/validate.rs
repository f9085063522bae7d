// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::model::{
    ConfigFile, DEFAULT_STORE_SIZE, MenuTask, RawConfigFile, RunSpec, WatchTask,
};
use crate::engine::TaskId;
use crate::errors::{Result, StagError};
use crate::exec::CommandTemplate;

/// Run semantic validation against a raw configuration and assign task ids.
///
/// This checks:
/// - there is at least one task
/// - at most one of `format` / `prefix` is set, and the template is usable
/// - every `run` has at least one non-empty command
/// - menu keys are non-empty and unique
///
/// Ids are assigned in order: all `[[watch]]` tables, then all `[[menu]]`
/// tables. Glob patterns are not checked here; they are resolved (and
/// rejected if malformed) when a task's watch set is built.
pub fn validate_config(raw: RawConfigFile) -> Result<ConfigFile> {
    ensure_has_tasks(&raw)?;
    let template = resolve_template(&raw)?;
    let store = match raw.store {
        Some(size) if size.0 > 0 => size.0,
        _ => DEFAULT_STORE_SIZE,
    };

    let mut next_id: TaskId = 0;

    let mut watch = Vec::with_capacity(raw.watch_tasks.len());
    for (pos, task) in raw.watch_tasks.into_iter().enumerate() {
        let id = next_id;
        next_id += 1;
        let what = format!("[[watch]] #{pos}");
        watch.push(WatchTask {
            id,
            name: task.name.unwrap_or_else(|| format!("task-{id}")),
            files: task.files,
            exclude: task.exclude,
            commands: validate_commands(task.run, &what)?,
            log: log_path(task.log),
        });
    }

    let mut keys = HashSet::new();
    let mut menu = Vec::with_capacity(raw.menu_tasks.len());
    for (pos, task) in raw.menu_tasks.into_iter().enumerate() {
        let id = next_id;
        next_id += 1;
        let what = format!("[[menu]] #{pos}");

        let key = task.key.trim().to_string();
        if key.is_empty() {
            return Err(StagError::Config(format!("{what} has an empty `key`")));
        }
        if !keys.insert(key.clone()) {
            return Err(StagError::Config(format!(
                "{what} reuses menu key '{key}'"
            )));
        }

        menu.push(MenuTask {
            id,
            name: task.name.unwrap_or_else(|| key.clone()),
            key,
            commands: validate_commands(task.run, &what)?,
            log: log_path(task.log),
        });
    }

    Ok(ConfigFile {
        template,
        store,
        watch,
        menu,
    })
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StagError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        validate_config(raw)
    }
}

fn ensure_has_tasks(raw: &RawConfigFile) -> Result<()> {
    if raw.watch_tasks.is_empty() && raw.menu_tasks.is_empty() {
        return Err(StagError::Config(
            "config must contain at least one [[watch]] or [[menu]] task".to_string(),
        ));
    }
    Ok(())
}

fn resolve_template(raw: &RawConfigFile) -> Result<CommandTemplate> {
    match (&raw.format, &raw.prefix) {
        (Some(_), Some(_)) => Err(StagError::Config(
            "`format` and `prefix` are mutually exclusive".to_string(),
        )),
        (Some(format), None) => CommandTemplate::parse(format),
        (None, Some(prefix)) => CommandTemplate::from_prefix(prefix),
        (None, None) => Ok(CommandTemplate::default()),
    }
}

fn validate_commands(run: RunSpec, what: &str) -> Result<Vec<String>> {
    let commands = run.into_commands();
    if commands.is_empty() {
        return Err(StagError::Config(format!("{what}: `run` cannot be empty")));
    }
    if commands.iter().any(|c| c.trim().is_empty()) {
        return Err(StagError::Config(format!(
            "{what}: `run` contains an empty command"
        )));
    }
    Ok(commands)
}

fn log_path(log: Option<String>) -> Option<PathBuf> {
    log.filter(|s| !s.trim().is_empty()).map(PathBuf::from)
}
