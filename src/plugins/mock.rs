//! `MockPlugin`: a source-agnostic input fixture for tests and the demo
//! binary's `--demo` mode, standing in for a real gesture/voice driver.
//! Registers no background task; `init` just stashes the core's handles so
//! `navigate`/`gesture`/`voice` can be called synchronously afterward.

use crate::core::NavigatorCore;
use crate::error::NavigatorError;
use crate::event_bus::EventBus;
use crate::store::actions::{gesture_detected, navigate, voice_command, Direction, InputSource};
use crate::store::{RootState, Store};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::plugin::Plugin;

pub struct MockPlugin {
    handles: Mutex<Option<(Arc<EventBus>, Arc<Store<RootState>>)>>,
}

impl MockPlugin {
    pub fn new() -> Self {
        Self { handles: Mutex::new(None) }
    }

    /// Dispatches `NAVIGATE` with `source: mock`, as if a scripted test
    /// driver had pressed a direction.
    pub fn navigate(&self, direction: Direction) {
        if let Some((_, store)) = self.handles.lock().unwrap().as_ref() {
            let _ = store.dispatch(navigate(direction, InputSource::Mock));
        }
    }

    /// Emits `input:gesture:sample` as a `(x, y)` pair, for driving
    /// `IntentPredictor` without a real camera/gesture backend.
    pub fn gesture_sample(&self, x: f64, y: f64) {
        if let Some((bus, _)) = self.handles.lock().unwrap().as_ref() {
            bus.emit("input:gesture:sample", serde_json::json!({ "x": x, "y": y }));
        }
    }

    /// Dispatches `GESTURE_DETECTED` directly, bypassing trajectory scoring.
    pub fn gesture(&self, gesture: impl Into<String>, confidence: f64) {
        if let Some((_, store)) = self.handles.lock().unwrap().as_ref() {
            let _ = store.dispatch(gesture_detected(gesture, confidence));
        }
    }

    pub fn voice(&self, command: impl Into<String>) {
        if let Some((_, store)) = self.handles.lock().unwrap().as_ref() {
            let _ = store.dispatch(voice_command(command));
        }
    }
}

impl Default for MockPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        "mock"
    }

    async fn init(&self, core: &NavigatorCore) -> Result<(), NavigatorError> {
        *self.handles.lock().unwrap() = Some((core.event_bus.clone(), core.store.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests;
