//! `KeyboardPlugin`: the one real input driver this crate ships. Reads
//! terminal key events via `crossterm` and translates arrow keys directly
//! into navigation intents — no separate "NavigationLogic" subscriber, the
//! translation lives in the same plugin that captures the raw key.
//!
//! The read loop polls with `event::poll(Duration::from_millis(10))` before
//! ever calling `event::read()`, the same non-blocking-guard idiom
//! `aspy::tui::run_event_loop` uses inside its own `tokio::select!` loop, so
//! the loop runs as a plain `tokio::spawn`ed task rather than parking a
//! blocking-pool thread on `event::read()` for the life of the plugin.

use crate::core::NavigatorCore;
use crate::error::NavigatorError;
use crate::event_bus::EventBus;
use crate::plugin::Plugin;
use crate::store::actions::{navigate, Direction, InputSource};
use crate::store::{RootState, Store};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode};
use std::sync::Mutex;
use std::time::Duration;

fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Left => "ArrowLeft".into(),
        KeyCode::Right => "ArrowRight".into(),
        KeyCode::Up => "ArrowUp".into(),
        KeyCode::Down => "ArrowDown".into(),
        KeyCode::Esc => "Escape".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Char(c) => c.to_string(),
        other => format!("{other:?}"),
    }
}

fn arrow_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        _ => None,
    }
}

fn direction_word(direction: Direction) -> &'static str {
    match direction {
        Direction::Left => "left",
        Direction::Right => "right",
        Direction::Up => "up",
        Direction::Down => "down",
    }
}

/// Handles one key press: emits `input:keyboard:keydown`, and for arrow
/// keys also emits `intent:navigate_{direction}` and dispatches `NAVIGATE`.
/// Free function (not a method) so tests can drive it without a real
/// terminal, the same shape as `intent::handle_sample`.
pub(crate) fn handle_key_press(event_bus: &EventBus, store: &Store<RootState>, code: KeyCode) {
    event_bus.emit("input:keyboard:keydown", serde_json::json!({ "key": key_name(code) }));

    if let Some(direction) = arrow_direction(code) {
        let word = direction_word(direction);
        event_bus.emit(&format!("intent:navigate_{word}"), serde_json::json!({ "direction": word }));
        let _ = store.dispatch(navigate(direction, InputSource::Keyboard));
    }
}

pub struct KeyboardPlugin {
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl KeyboardPlugin {
    pub fn new() -> Self {
        Self { task: Mutex::new(None) }
    }
}

impl Default for KeyboardPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for KeyboardPlugin {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn priority(&self) -> i32 {
        20
    }

    async fn init(&self, core: &NavigatorCore) -> Result<(), NavigatorError> {
        let event_bus = core.event_bus.clone();
        let store = core.store.clone();

        let handle = tokio::spawn(async move {
            if crossterm::terminal::enable_raw_mode().is_err() {
                tracing::warn!("could not enable raw terminal mode, keyboard input disabled");
                return;
            }
            loop {
                match event::poll(Duration::from_millis(10)) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key_event)) => {
                            let code = key_event.code;
                            handle_key_press(&event_bus, &store, code);
                            if code == KeyCode::Esc {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "keyboard read failed, stopping input loop");
                            break;
                        }
                    },
                    Ok(false) => tokio::task::yield_now().await,
                    Err(e) => {
                        tracing::warn!(error = %e, "keyboard poll failed, stopping input loop");
                        break;
                    }
                }
            }
            let _ = crossterm::terminal::disable_raw_mode();
        });

        *self.task.lock().unwrap() = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), NavigatorError> {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
        let _ = crossterm::terminal::disable_raw_mode();
        Ok(())
    }

    async fn destroy(&self) -> Result<(), NavigatorError> {
        self.stop().await
    }
}
