//! `StoreAction` and the well-known action creators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action type-string constants, matched against in `reducers::root_reducer`.
pub mod types {
    pub const NAVIGATE: &str = "NAVIGATE";
    pub const KEY_PRESS: &str = "KEY_PRESS";
    pub const KEY_RELEASE: &str = "KEY_RELEASE";
    pub const GESTURE_DETECTED: &str = "GESTURE_DETECTED";
    pub const VOICE_COMMAND: &str = "VOICE_COMMAND";
    pub const SET_COGNITIVE_STATE: &str = "SET_COGNITIVE_STATE";
    pub const SET_THEME: &str = "SET_THEME";
    pub const SET_TOTAL_CARDS: &str = "SET_TOTAL_CARDS";
    pub const SET_WRAPPING: &str = "SET_WRAPPING";
    pub const SET_TRANSITIONING: &str = "SET_TRANSITIONING";
    pub const SET_LAYER: &str = "SET_LAYER";
    pub const SET_INPUT_ENABLED: &str = "SET_INPUT_ENABLED";
    pub const SET_IDLE: &str = "SET_IDLE";
    pub const SET_CAMERA_STATE: &str = "SET_CAMERA_STATE";
    pub const SET_PERFORMANCE_MODE: &str = "SET_PERFORMANCE_MODE";
    pub const SET_UI_VISIBILITY: &str = "SET_UI_VISIBILITY";
    pub const RECORD_FRAME: &str = "RECORD_FRAME";
    pub const AWARD_EXPERIENCE: &str = "AWARD_EXPERIENCE";
    pub const UNLOCK_ACHIEVEMENT: &str = "UNLOCK_ACHIEVEMENT";
    pub const SET_PLUGIN_SLICE: &str = "SET_PLUGIN_SLICE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    Keyboard,
    Gesture,
    Voice,
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMeta {
    pub source: Option<String>,
    pub timestamp_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreAction {
    #[serde(rename = "type")]
    pub type_: String,
    pub payload: Value,
    pub meta: Option<ActionMeta>,
}

impl StoreAction {
    pub fn new(type_: impl Into<String>, payload: Value) -> Self {
        Self {
            type_: type_.into(),
            payload,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: ActionMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

pub fn navigate(direction: Direction, source: InputSource) -> StoreAction {
    StoreAction::new(
        types::NAVIGATE,
        serde_json::json!({ "direction": direction, "source": source }),
    )
}

pub fn key_press(key: impl Into<String>) -> StoreAction {
    StoreAction::new(types::KEY_PRESS, serde_json::json!({ "key": key.into() }))
}

pub fn key_release(key: impl Into<String>) -> StoreAction {
    StoreAction::new(types::KEY_RELEASE, serde_json::json!({ "key": key.into() }))
}

pub fn gesture_detected(gesture: impl Into<String>, confidence: f64) -> StoreAction {
    StoreAction::new(
        types::GESTURE_DETECTED,
        serde_json::json!({ "gesture": gesture.into(), "confidence": confidence }),
    )
}

pub fn voice_command(command: impl Into<String>) -> StoreAction {
    StoreAction::new(types::VOICE_COMMAND, serde_json::json!({ "command": command.into() }))
}

pub fn set_cognitive_state(state: impl Into<String>) -> StoreAction {
    StoreAction::new(types::SET_COGNITIVE_STATE, serde_json::json!({ "state": state.into() }))
}

/// Configures the navigable deck size; an embedder dispatches this once it
/// knows how many cards/layers exist, before any `NAVIGATE` action.
pub fn set_total_cards(total_cards: i64) -> StoreAction {
    StoreAction::new(types::SET_TOTAL_CARDS, serde_json::json!({ "totalCards": total_cards }))
}

pub fn set_wrapping(wrapping: bool) -> StoreAction {
    StoreAction::new(types::SET_WRAPPING, serde_json::json!({ "wrapping": wrapping }))
}

pub fn set_transitioning(is_transitioning: bool) -> StoreAction {
    StoreAction::new(types::SET_TRANSITIONING, serde_json::json!({ "isTransitioning": is_transitioning }))
}

pub fn set_layer(current_layer: i64, total_layers: i64, layer_name: impl Into<String>) -> StoreAction {
    StoreAction::new(
        types::SET_LAYER,
        serde_json::json!({ "currentLayer": current_layer, "totalLayers": total_layers, "layerName": layer_name.into() }),
    )
}

pub fn set_input_enabled(keyboard: bool, gesture: bool, voice: bool) -> StoreAction {
    StoreAction::new(
        types::SET_INPUT_ENABLED,
        serde_json::json!({ "keyboardEnabled": keyboard, "gestureEnabled": gesture, "voiceEnabled": voice }),
    )
}

/// Dispatched on `system:pause`/`system:resume`; sets `system.isIdle` and,
/// when going idle, stamps `idleStartTime` from the action's own
/// `meta.timestamp_ms`.
pub fn set_idle(is_idle: bool, timestamp_ms: u64) -> StoreAction {
    StoreAction::new(types::SET_IDLE, serde_json::json!({ "isIdle": is_idle }))
        .with_meta(ActionMeta { source: None, timestamp_ms: Some(timestamp_ms) })
}

pub fn set_camera_state(camera_active: bool, hand_detected: bool, media_pipe_ready: bool) -> StoreAction {
    StoreAction::new(
        types::SET_CAMERA_STATE,
        serde_json::json!({ "cameraActive": camera_active, "handDetected": hand_detected, "mediaPipeReady": media_pipe_ready }),
    )
}

pub fn set_performance_mode(mode: &str) -> StoreAction {
    StoreAction::new(types::SET_PERFORMANCE_MODE, serde_json::json!({ "performanceMode": mode }))
}

pub fn set_ui_visibility(
    start_screen_visible: Option<bool>,
    hud_visible: Option<bool>,
    debug_panel_visible: Option<bool>,
    fullscreen_card: Option<i64>,
) -> StoreAction {
    StoreAction::new(
        types::SET_UI_VISIBILITY,
        serde_json::json!({
            "startScreenVisible": start_screen_visible,
            "hudVisible": hud_visible,
            "debugPanelVisible": debug_panel_visible,
            "fullscreenCard": fullscreen_card,
        }),
    )
}

pub fn record_frame(fps: f64, timestamp_ms: u64) -> StoreAction {
    StoreAction::new(types::RECORD_FRAME, serde_json::json!({ "fps": fps, "timestampMs": timestamp_ms }))
}

pub fn award_experience(points: i64) -> StoreAction {
    StoreAction::new(types::AWARD_EXPERIENCE, serde_json::json!({ "points": points }))
}

pub fn unlock_achievement(name: impl Into<String>) -> StoreAction {
    StoreAction::new(types::UNLOCK_ACHIEVEMENT, serde_json::json!({ "achievement": name.into() }))
}

/// Only the named plugin should ever dispatch this for its own `name`; see
/// `RootState::plugins`.
pub fn set_plugin_slice(plugin: impl Into<String>, slice: Value) -> StoreAction {
    StoreAction::new(types::SET_PLUGIN_SLICE, serde_json::json!({ "plugin": plugin.into(), "slice": slice }))
}
