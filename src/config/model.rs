// src/config/model.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::engine::{TaskId, TaskSpec};
use crate::exec::CommandTemplate;

/// Retained output per task when `store` is not set (1 MiB).
pub const DEFAULT_STORE_SIZE: u64 = 1024 * 1024;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// format = "bash -c %"
/// store = "1M"
///
/// [[watch]]
/// files = ["src/**/*.{rs,toml}"]
/// exclude = ["src/generated/**"]
/// run = ["cargo build", "cargo test"]
/// log = "build.log"
///
/// [[menu]]
/// key = "d"
/// run = "cargo doc"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Command template; `%` is replaced by the command.
    #[serde(default)]
    pub format: Option<String>,

    /// Alternative to `format`: argv prefix, the command becomes the last
    /// argument.
    #[serde(default)]
    pub prefix: Option<Vec<String>>,

    /// Retained output per task for the display layer.
    #[serde(default)]
    pub store: Option<StoreSize>,

    /// `[[watch]]` tables.
    #[serde(default, rename = "watch")]
    pub watch_tasks: Vec<RawWatchTask>,

    /// `[[menu]]` tables.
    #[serde(default, rename = "menu")]
    pub menu_tasks: Vec<RawMenuTask>,
}

/// `[[watch]]` table: auto-started, restarted on file changes.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWatchTask {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    pub run: RunSpec,

    #[serde(default)]
    pub log: Option<String>,
}

/// `[[menu]]` table: started by pressing `key`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMenuTask {
    pub key: String,

    #[serde(default)]
    pub name: Option<String>,

    pub run: RunSpec,

    #[serde(default)]
    pub log: Option<String>,
}

/// `run = "cmd"` or `run = ["cmd1", "cmd2"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RunSpec {
    One(String),
    Many(Vec<String>),
}

impl RunSpec {
    pub fn into_commands(self) -> Vec<String> {
        match self {
            RunSpec::One(cmd) => vec![cmd],
            RunSpec::Many(cmds) => cmds,
        }
    }
}

/// A byte count written as `"512B"`, `"64K"`, `"1M"`, `"2G"`, `"4096"` or a
/// bare TOML integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawStoreSize")]
pub struct StoreSize(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStoreSize {
    Bytes(u64),
    Text(String),
}

impl TryFrom<RawStoreSize> for StoreSize {
    type Error = String;

    fn try_from(raw: RawStoreSize) -> Result<Self, Self::Error> {
        match raw {
            RawStoreSize::Bytes(n) => Ok(StoreSize(n)),
            RawStoreSize::Text(s) => s.parse(),
        }
    }
}

impl FromStr for StoreSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(last) = s.chars().last() else {
            return Err("empty store size".to_string());
        };

        let (digits, multiplier) = match last.to_ascii_uppercase() {
            'B' => (&s[..s.len() - 1], 1u64),
            'K' => (&s[..s.len() - 1], 1024),
            'M' => (&s[..s.len() - 1], 1024 * 1024),
            'G' => (&s[..s.len() - 1], 1024 * 1024 * 1024),
            c if c.is_ascii_digit() => (s, 1),
            _ => return Err(format!("invalid size suffix in '{s}' (expected B, K, M or G)")),
        };

        let base: u64 = digits
            .trim()
            .parse()
            .map_err(|e| format!("invalid store size '{s}': {e}"))?;

        base.checked_mul(multiplier)
            .map(StoreSize)
            .ok_or_else(|| format!("store size '{s}' is too large"))
    }
}

impl fmt::Display for StoreSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub template: CommandTemplate,
    /// Bytes of output retained per task by the console.
    pub store: u64,
    pub watch: Vec<WatchTask>,
    pub menu: Vec<MenuTask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTask {
    pub id: TaskId,
    pub name: String,
    pub files: Vec<String>,
    pub exclude: Vec<String>,
    pub commands: Vec<String>,
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTask {
    pub id: TaskId,
    pub key: String,
    pub name: String,
    pub commands: Vec<String>,
    pub log: Option<PathBuf>,
}

impl WatchTask {
    pub fn spec(&self, template: &CommandTemplate) -> TaskSpec {
        TaskSpec {
            id: self.id,
            name: self.name.clone(),
            commands: self.commands.clone(),
            template: template.clone(),
            log_path: self.log.clone(),
            is_menu_task: false,
        }
    }
}

impl MenuTask {
    pub fn spec(&self, template: &CommandTemplate) -> TaskSpec {
        TaskSpec {
            id: self.id,
            name: self.name.clone(),
            commands: self.commands.clone(),
            template: template.clone(),
            log_path: self.log.clone(),
            is_menu_task: true,
        }
    }
}

impl ConfigFile {
    pub fn task_count(&self) -> usize {
        self.watch.len() + self.menu.len()
    }

    pub fn menu_by_key(&self, key: &str) -> Option<&MenuTask> {
        self.menu.iter().find(|m| m.key == key)
    }
}
