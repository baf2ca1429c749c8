//! Legacy reactive state container, predating the Redux-style [`crate::store`].
//!
//! Arbitrary dot-path reads/writes over a `serde_json::Value` tree, with
//! watchers, a bounded undo ring, and bus events on every change. Kept
//! around because plugins written against the old API still address state
//! by path string rather than by typed slice.

mod merge;
mod watch;

pub use watch::{WatchHandle, WatchMode};

use crate::event_bus::EventBus;
use crate::persistence::PersistenceBackend;
use merge::{build_partial, deep_merge, get_path, path_matches, shallow_replace};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use watch::Watcher;

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct SetStateOptions {
    /// Suppress all bus events and watcher notifications for this update.
    pub silent: bool,
    /// Deep-merge into existing state (default). `false` replaces each
    /// updated top-level key's value wholesale instead of merging into it.
    pub merge: bool,
    pub source: Option<&'static str>,
}

impl SetStateOptions {
    pub fn merged() -> Self {
        Self {
            silent: false,
            merge: true,
            source: None,
        }
    }
}

struct Inner {
    state: Value,
    default_snapshot: Value,
    history: VecDeque<Value>,
    history_limit: usize,
    watchers: Vec<Watcher>,
    next_watcher_id: u64,
}

pub struct AppState {
    inner: Arc<Mutex<Inner>>,
    bus: Arc<EventBus>,
    persistence: PersistenceBackend,
}

impl AppState {
    pub fn new(bus: Arc<EventBus>, default_state: Value) -> Self {
        Self::with_persistence(bus, default_state, PersistenceBackend::default())
    }

    pub fn with_persistence(
        bus: Arc<EventBus>,
        default_state: Value,
        persistence: PersistenceBackend,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: default_state.clone(),
                default_snapshot: default_state,
                history: VecDeque::with_capacity(DEFAULT_HISTORY_LIMIT),
                history_limit: DEFAULT_HISTORY_LIMIT,
                watchers: Vec::new(),
                next_watcher_id: 1,
            })),
            bus,
            persistence,
        }
    }

    /// Dot-path read, e.g. `get("navigation.currentCardIndex", None)`.
    /// Returns `default` (or `Value::Null`) when the path is absent.
    pub fn get(&self, path: &str, default: Option<Value>) -> Value {
        let inner = self.inner.lock().unwrap();
        get_path(&inner.state, path)
            .cloned()
            .unwrap_or_else(|| default.unwrap_or(Value::Null))
    }

    pub fn get_state(&self) -> Value {
        self.inner.lock().unwrap().state.clone()
    }

    /// Write a single dot-path, building the nested partial
    /// (`"a.b"` + `5` -> `{"a": {"b": 5}}`) before merging.
    pub fn set_path(&self, path: &str, value: Value, opts: SetStateOptions) {
        let partial = build_partial(path, value);
        self.apply_update(partial, opts);
    }

    /// Write a partial object; each top-level key is deep-merged (or
    /// replaced, if `opts.merge == false`) into the corresponding slice.
    pub fn set_partial(&self, partial: Value, opts: SetStateOptions) {
        self.apply_update(partial, opts);
    }

    fn apply_update(&self, partial: Value, opts: SetStateOptions) {
        let updated_keys: Vec<String> = partial
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();

        let (previous, current, matched) = {
            let mut inner = self.inner.lock().unwrap();
            let previous = inner.state.clone();

            if opts.merge {
                deep_merge(&mut inner.state, &partial);
            } else {
                shallow_replace(&mut inner.state, &partial);
            }

            let current = inner.state.clone();
            push_history(&mut inner, previous.clone());

            let mut matched = Vec::new();
            let mut seen = std::collections::HashSet::new();
            for w in &inner.watchers {
                let hits = updated_keys.iter().any(|k| path_matches(k, &w.path));
                if hits && seen.insert(w.id) {
                    matched.push(w.clone());
                }
            }
            (previous, current, matched)
        };

        if opts.silent {
            return;
        }

        self.bus.emit(
            "state:changed",
            serde_json::json!({
                "previous": previous,
                "current": current,
                "updates": partial,
                "source": opts.source,
            }),
        );

        for key in &updated_keys {
            self.bus.emit(
                &format!("state:{key}:changed"),
                serde_json::json!({
                    "previous": previous.get(key),
                    "current": current.get(key),
                }),
            );
        }

        for w in matched {
            w.notify(&self.inner, &previous, &current);
        }

        self.bus.emit("state:computed:updated", serde_json::json!({}));
    }

    /// Register a watcher on `path`. `WatchMode::Sync` (default) invokes the
    /// callback inline during `set_path`/`set_partial`; `WatchMode::Debounce`
    /// coalesces a burst of matching updates into one call after the given
    /// quiescence window, re-reading the path's latest value when it fires.
    pub fn watch<F>(&self, path: impl Into<String>, mode: WatchMode, callback: F) -> WatchHandle
    where
        F: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_watcher_id;
        inner.next_watcher_id += 1;
        inner.watchers.push(Watcher::new(id, path.into(), mode, callback));
        WatchHandle {
            id,
            inner: self.inner.clone(),
        }
    }

    pub fn unwatch(&self, handle: &WatchHandle) {
        self.inner.lock().unwrap().watchers.retain(|w| w.id != handle.id);
    }

    /// Most recent `limit` historical snapshots, oldest first. Does not
    /// include the current state.
    pub fn get_history(&self, limit: usize) -> Vec<Value> {
        let inner = self.inner.lock().unwrap();
        let start = inner.history.len().saturating_sub(limit);
        inner.history.iter().skip(start).cloned().collect()
    }

    /// Replace current state with the snapshot `steps_back` entries before
    /// the present in history (1 = the state immediately prior to the last
    /// change). Emits only `state:timetravel`, not the full change cascade.
    pub fn time_travel(&self, steps_back: usize) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if steps_back == 0 || steps_back > inner.history.len() {
            return false;
        }
        let idx = inner.history.len() - steps_back;
        let snapshot = inner.history[idx].clone();
        inner.state = snapshot.clone();
        drop(inner);
        self.bus.emit(
            "state:timetravel",
            serde_json::json!({ "stepsBack": steps_back, "state": snapshot }),
        );
        true
    }

    pub fn persist(&self, key: &str) -> Result<(), crate::error::NavigatorError> {
        let state = self.get_state();
        self.persistence.save(key, &state)
    }

    pub fn restore(&self, key: &str) -> Result<(), crate::error::NavigatorError> {
        if let Some(state) = self.persistence.load(key)? {
            self.inner.lock().unwrap().state = state.clone();
            self.bus.emit("state:restored", serde_json::json!({ "state": state }));
        }
        Ok(())
    }

    pub fn reset(&self, silent: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = inner.default_snapshot.clone();
        drop(inner);
        if !silent {
            self.bus.emit("state:reset", serde_json::json!({}));
        }
    }
}

fn push_history(inner: &mut Inner, snapshot: Value) {
    if inner.history.len() >= inner.history_limit {
        inner.history.pop_front();
    }
    inner.history.push_back(snapshot);
}

#[cfg(test)]
mod tests;
