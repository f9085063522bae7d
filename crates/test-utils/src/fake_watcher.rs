use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stag::errors::{Result, StagError};
use stag::watch::{ChangeWatcher, WatchEvent, WatchSubscription};
use tokio::sync::mpsc;

/// Watcher whose events are pushed by the test.
///
/// Clones share state: hand one clone to the task and keep another to send
/// events and inspect subscriptions.
#[derive(Debug, Clone, Default)]
pub struct ChannelWatcher {
    feeds: Arc<Mutex<Vec<mpsc::UnboundedSender<WatchEvent>>>>,
    subscribed: Arc<Mutex<Vec<Vec<String>>>>,
    fail_with: Option<String>,
}

impl ChannelWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A watcher whose `subscribe` always fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Path lists passed to `subscribe`, in order.
    pub fn subscriptions(&self) -> Vec<Vec<String>> {
        self.subscribed.lock().unwrap().clone()
    }

    /// True while some subscription is still held by its task.
    pub fn is_live(&self) -> bool {
        self.feeds.lock().unwrap().iter().any(|tx| !tx.is_closed())
    }

    pub fn send(&self, event: WatchEvent) {
        for tx in self.feeds.lock().unwrap().iter() {
            let _ = tx.send(event.clone());
        }
    }

    pub fn change(&self, path: &str) {
        self.send(WatchEvent::Changed(PathBuf::from(path)));
    }

    pub fn error(&self, text: &str) {
        self.send(WatchEvent::Error(text.to_string()));
    }

    /// Wait until a live subscription exists.
    pub async fn wait_live(&self) {
        while !self.is_live() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl ChangeWatcher for ChannelWatcher {
    fn subscribe(&mut self, paths: &[String]) -> Result<WatchSubscription> {
        self.subscribed.lock().unwrap().push(paths.to_vec());
        if let Some(message) = &self.fail_with {
            return Err(StagError::Watch(message.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().unwrap().push(tx);
        Ok(WatchSubscription::new(rx, None))
    }
}
