//! Watcher registration and dispatch, including debounced firing.

use super::Inner;
use super::merge::get_path;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum WatchMode {
    Sync,
    Debounce(Duration),
}

type Callback = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

pub(super) struct Watcher {
    pub id: u64,
    pub path: String,
    mode: WatchMode,
    callback: Callback,
    generation: Arc<AtomicU64>,
}

impl Clone for Watcher {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            path: self.path.clone(),
            mode: self.mode,
            callback: self.callback.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl Watcher {
    pub fn new<F>(id: u64, path: String, mode: WatchMode, callback: F) -> Self
    where
        F: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        Self {
            id,
            path,
            mode,
            callback: Arc::new(callback),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `previous`/`current` are full root snapshots; the callback receives
    /// only the values at this watcher's path.
    pub fn notify(&self, inner: &Arc<Mutex<Inner>>, previous: &Value, current: &Value) {
        let prev_at_path = get_path(previous, &self.path).cloned().unwrap_or(Value::Null);
        let curr_at_path = get_path(current, &self.path).cloned().unwrap_or(Value::Null);

        match self.mode {
            WatchMode::Sync => {
                (self.callback)(&curr_at_path, &prev_at_path);
            }
            WatchMode::Debounce(duration) => {
                let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let generation = self.generation.clone();
                let callback = self.callback.clone();
                let inner = inner.clone();
                let path = self.path.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    if generation.load(Ordering::SeqCst) != my_gen {
                        return; // superseded by a later update before quiescence
                    }
                    let latest = {
                        let inner = inner.lock().unwrap();
                        get_path(&inner.state, &path).cloned().unwrap_or(Value::Null)
                    };
                    callback(&latest, &prev_at_path);
                });
            }
        }
    }
}

/// Returned by `AppState::watch`; drop does not unregister, call `unwatch()`
/// (or `AppState::unwatch(&handle)`) explicitly.
pub struct WatchHandle {
    pub(super) id: u64,
    pub(super) inner: Arc<Mutex<Inner>>,
}

impl WatchHandle {
    pub fn unwatch(&self) {
        self.inner.lock().unwrap().watchers.retain(|w| w.id != self.id);
    }
}
