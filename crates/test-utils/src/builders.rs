#![allow(dead_code)]

use std::path::PathBuf;

use stag::config::{ConfigFile, RawConfigFile, RawMenuTask, RawWatchTask, RunSpec};
use stag::engine::{TaskId, TaskSpec};
use stag::exec::CommandTemplate;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_watch(mut self, task: RawWatchTask) -> Self {
        self.config.watch_tasks.push(task);
        self
    }

    pub fn with_menu(mut self, task: RawMenuTask) -> Self {
        self.config.menu_tasks.push(task);
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.config.format = Some(format.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `[[watch]]` table.
pub struct WatchTaskBuilder {
    task: RawWatchTask,
}

impl WatchTaskBuilder {
    pub fn new(commands: &[&str]) -> Self {
        Self {
            task: RawWatchTask {
                name: None,
                files: vec![],
                exclude: vec![],
                run: RunSpec::Many(commands.iter().map(|c| c.to_string()).collect()),
                log: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = Some(name.to_string());
        self
    }

    pub fn files(mut self, pattern: &str) -> Self {
        self.task.files.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn log(mut self, path: &str) -> Self {
        self.task.log = Some(path.to_string());
        self
    }

    pub fn build(self) -> RawWatchTask {
        self.task
    }
}

/// Builder for a `[[menu]]` table.
pub struct MenuTaskBuilder {
    task: RawMenuTask,
}

impl MenuTaskBuilder {
    pub fn new(key: &str, commands: &[&str]) -> Self {
        Self {
            task: RawMenuTask {
                key: key.to_string(),
                name: None,
                run: RunSpec::Many(commands.iter().map(|c| c.to_string()).collect()),
                log: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = Some(name.to_string());
        self
    }

    pub fn build(self) -> RawMenuTask {
        self.task
    }
}

/// Builder for `TaskSpec`, for driving a single `Task` directly.
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(commands: &[&str]) -> Self {
        Self {
            spec: TaskSpec {
                id: 0,
                name: "test".to_string(),
                commands: commands.iter().map(|c| c.to_string()).collect(),
                template: CommandTemplate::default(),
                log_path: None,
                is_menu_task: false,
            },
        }
    }

    pub fn id(mut self, id: TaskId) -> Self {
        self.spec.id = id;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.spec.name = name.to_string();
        self
    }

    pub fn template(mut self, template: &str) -> Self {
        self.spec.template =
            CommandTemplate::parse(template).expect("Failed to parse command template");
        self
    }

    pub fn log(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec.log_path = Some(path.into());
        self
    }

    pub fn menu(mut self) -> Self {
        self.spec.is_menu_task = true;
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}
