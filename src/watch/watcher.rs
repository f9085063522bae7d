// src/watch/watcher.rs

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::errors::{Result, StagError};

/// A notification from the filesystem-watch facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Something happened to this path. The kind of change is irrelevant.
    Changed(PathBuf),
    /// The watch backend reported an asynchronous error.
    Error(String),
}

/// Facility that turns a resolved watch set into a stream of change events.
///
/// Production code uses [`NotifyWatcher`]; tests hand out channels they feed
/// themselves.
pub trait ChangeWatcher: Send {
    fn subscribe(&mut self, paths: &[String]) -> Result<WatchSubscription>;
}

/// A live subscription. Dropping it stops watching.
pub struct WatchSubscription {
    events: mpsc::UnboundedReceiver<WatchEvent>,
    _guard: Option<Box<dyn Any + Send>>,
}

impl fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSubscription").finish_non_exhaustive()
    }
}

impl WatchSubscription {
    /// Wrap an event channel. `guard` is kept alive for as long as the
    /// subscription (e.g. the underlying OS watcher).
    pub fn new(
        events: mpsc::UnboundedReceiver<WatchEvent>,
        guard: Option<Box<dyn Any + Send>>,
    ) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }

    /// Next event, or `None` once the event source is gone.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }
}

/// Watcher backed by `notify`'s recommended platform backend.
///
/// Each path is watched non-recursively: a file reports its own changes, a
/// directory reports changes to its direct entries.
#[derive(Debug, Clone, Default)]
pub struct NotifyWatcher;

impl NotifyWatcher {
    pub fn new() -> Self {
        Self
    }
}

impl ChangeWatcher for NotifyWatcher {
    fn subscribe(&mut self, paths: &[String]) -> Result<WatchSubscription> {
        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // Opening or reading a watched file is not a change; a
                    // command that reads its own sources would restart itself.
                    if matches!(event.kind, EventKind::Access(_)) {
                        trace!(?event, "ignoring access event");
                        return;
                    }
                    for path in event.paths {
                        let _ = event_tx.send(WatchEvent::Changed(path));
                    }
                }
                Err(err) => {
                    let _ = event_tx.send(WatchEvent::Error(err.to_string()));
                }
            },
            Config::default(),
        )?;

        for path in paths {
            watcher
                .watch(Path::new(path), RecursiveMode::NonRecursive)
                .map_err(|e| StagError::Watch(format!("watching {path}: {e}")))?;
            debug!(path = %path, "watching path");
        }

        info!(count = paths.len(), "file watcher started");
        Ok(WatchSubscription::new(event_rx, Some(Box::new(watcher))))
    }
}
