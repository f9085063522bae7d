// src/fs/mod.rs

//! Filesystem access used by the glob resolver and the config loader.
//!
//! Going through a trait lets the resolver run against [`mock::MockFileSystem`]
//! in tests without touching the disk.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// True if something exists at `path` (a dangling symlink counts).
    fn exists(&self, path: &Path) -> bool;

    /// True if `path` is a directory, following symlinks.
    fn is_dir(&self, path: &Path) -> bool;

    /// True if `path` itself is a symlink. Directory walks do not descend
    /// through symlinks.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
