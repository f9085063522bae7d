// src/engine/log_mirror.rs

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Raw append-only copy of everything a task emits.
///
/// Opened once when the task starts (truncating any previous content) and
/// written only by that task's loop.
#[derive(Debug)]
pub struct LogMirror {
    path: PathBuf,
    file: File,
}

impl LogMirror {
    pub async fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::create(&path).await?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text` and flush it, so a reader of the file sees every chunk
    /// that has reached the output stream.
    pub async fn write(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes()).await?;
        self.file.flush().await
    }
}
