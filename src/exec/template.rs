// src/exec/template.rs

//! Command templates: how a raw command string becomes an argv.

use std::fmt;

use crate::errors::{Result, StagError};

/// Placeholder replaced by the command text in every template field.
pub const PLACEHOLDER: &str = "%";

/// Template used when the config sets neither `format` nor `prefix`.
pub const DEFAULT_TEMPLATE: &str = "bash -c %";

/// A whitespace-tokenised template such as `bash -c %`.
///
/// The command text is substituted *after* tokenisation, so `echo hi` stays a
/// single argument: `["bash", "-c", "echo hi"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    fields: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<String> = text.split_whitespace().map(str::to_string).collect();

        if fields.is_empty() {
            return Err(StagError::Config("command template is empty".to_string()));
        }
        if !fields.iter().any(|f| f.contains(PLACEHOLDER)) {
            return Err(StagError::Config(format!(
                "command template '{text}' has no '{PLACEHOLDER}' placeholder"
            )));
        }

        Ok(Self { fields })
    }

    /// Build a template from an argv prefix: the command becomes the last field.
    pub fn from_prefix<S: AsRef<str>>(prefix: &[S]) -> Result<Self> {
        let mut fields: Vec<String> = prefix.iter().map(|s| s.as_ref().to_string()).collect();
        if fields.is_empty() {
            return Err(StagError::Config("command prefix is empty".to_string()));
        }
        fields.push(PLACEHOLDER.to_string());
        Ok(Self { fields })
    }

    /// Substitute `command` for every placeholder occurrence.
    pub fn render(&self, command: &str) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| field.replace(PLACEHOLDER, command))
            .collect()
    }
}

impl Default for CommandTemplate {
    fn default() -> Self {
        Self {
            fields: DEFAULT_TEMPLATE.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(" "))
    }
}
