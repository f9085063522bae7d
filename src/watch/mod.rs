// src/watch/mod.rs

//! File-set resolution and change watching.
//!
//! This module is responsible for:
//! - Resolving `files` / `exclude` glob patterns into a concrete watch set
//!   ([`glob`]).
//! - Subscribing to filesystem changes on that set via `notify`
//!   ([`watcher`]).
//!
//! It does **not** know about tasks or commands; the engine decides what a
//! change means.

pub mod glob;
pub mod path_utils;
pub mod watcher;

pub use glob::{expand_extension, expand_glob, globs, resolve_watch_set, subtract};
pub use watcher::{ChangeWatcher, NotifyWatcher, WatchEvent, WatchSubscription};
