//! IntentPredictor analyzer plugin: scores a normalized hand trajectory
//! against a small gesture signature database and emits confidence-graded
//! predictions, adaptive to the current cognitive state.
//!
//! Unlike `CognitiveModel`, this plugin is sample-driven rather than
//! timer-driven: it subscribes to `input:gesture:sample` on the `EventBus`
//! in `init` and recomputes its scores synchronously for every sample,
//! mirroring the spec's "scoring is synchronous per sample" rule.
//!
//! `Plugin::init` only hands us `&self`/`&NavigatorCore`, both borrowed for
//! the duration of the call, so the subscribed closures cannot capture
//! `self` — they capture `Arc` clones of the predictor's buffer state and
//! of the core's own `Arc`-typed handles (`event_bus`, `store`) instead.
//! The subscription ids are stashed on `self` and released in
//! `stop`/`destroy`, per the crate's resource-scoping convention.

use crate::core::NavigatorCore;
use crate::error::NavigatorError;
use crate::event_bus::{EventBus, SubscriptionId};
use crate::plugin::Plugin;
use crate::store::{RootState, Store};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    pub x: f64,
    pub y: f64,
    pub t_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccelerationPattern {
    Accelerating,
    Decelerating,
    Constant,
}

struct Features {
    direction: (f64, f64),
    distance: f64,
    speed: f64,
    acceleration: AccelerationPattern,
}

/// Direction + velocity range + acceleration pattern scored against live
/// trajectory features. `direction` is `(0.0, 0.0)` for signatures defined
/// by near-zero displacement (`point`, `pinch`) rather than a heading —
/// this predictor only ever sees a single normalized hand position, so a
/// true two-point pinch scale is unavailable; `pinch` is approximated here
/// as "stationary, slower than a point" (see DESIGN.md).
struct GestureSignature {
    name: &'static str,
    direction: (f64, f64),
    speed_range: (f64, f64),
    acceleration: AccelerationPattern,
    stationary: bool,
}

const W_DIR: f64 = 0.4;
const W_VEL: f64 = 0.4;
const W_ACC: f64 = 0.2;

const STATIONARY_DISTANCE_THRESHOLD: f64 = 0.05;

fn signatures() -> [GestureSignature; 6] {
    [
        GestureSignature { name: "swipe_left", direction: (-1.0, 0.0), speed_range: (0.5, 6.0), acceleration: AccelerationPattern::Accelerating, stationary: false },
        GestureSignature { name: "swipe_right", direction: (1.0, 0.0), speed_range: (0.5, 6.0), acceleration: AccelerationPattern::Accelerating, stationary: false },
        GestureSignature { name: "swipe_up", direction: (0.0, -1.0), speed_range: (0.5, 6.0), acceleration: AccelerationPattern::Accelerating, stationary: false },
        GestureSignature { name: "swipe_down", direction: (0.0, 1.0), speed_range: (0.5, 6.0), acceleration: AccelerationPattern::Accelerating, stationary: false },
        GestureSignature { name: "point", direction: (0.0, 0.0), speed_range: (0.0, 0.3), acceleration: AccelerationPattern::Constant, stationary: true },
        GestureSignature { name: "pinch", direction: (0.0, 0.0), speed_range: (0.0, 0.2), acceleration: AccelerationPattern::Constant, stationary: true },
    ]
}

/// Displacement/direction/speed/acceleration-pattern features over the
/// whole buffer: first sample to last for displacement, the buffer's
/// first-half vs second-half average segment speed for acceleration.
fn extract_features(buffer: &VecDeque<HandSample>) -> Features {
    let first = buffer.front().copied().unwrap();
    let last = buffer.back().copied().unwrap();

    let dx = last.x - first.x;
    let dy = last.y - first.y;
    let distance = (dx * dx + dy * dy).sqrt();
    let direction = if distance > f64::EPSILON { (dx / distance, dy / distance) } else { (0.0, 0.0) };

    let duration_s = (last.t_ms.saturating_sub(first.t_ms)) as f64 / 1000.0;
    let speed = if duration_s > 0.0 { distance / duration_s } else { 0.0 };

    let segment_speeds: Vec<f64> = buffer
        .iter()
        .zip(buffer.iter().skip(1))
        .map(|(a, b)| {
            let dt = (b.t_ms.saturating_sub(a.t_ms)) as f64 / 1000.0;
            if dt <= 0.0 {
                return 0.0;
            }
            let d = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
            d / dt
        })
        .collect();

    let acceleration = if segment_speeds.len() < 2 {
        AccelerationPattern::Constant
    } else {
        let half = segment_speeds.len() / 2;
        let early: f64 = segment_speeds[..half].iter().sum::<f64>() / half as f64;
        let late: f64 = segment_speeds[half..].iter().sum::<f64>() / (segment_speeds.len() - half) as f64;
        if late > early * 1.2 {
            AccelerationPattern::Accelerating
        } else if late < early * 0.8 {
            AccelerationPattern::Decelerating
        } else {
            AccelerationPattern::Constant
        }
    };

    Features { direction, distance, speed, acceleration }
}

fn dir_score(sig: &GestureSignature, features: &Features) -> f64 {
    if sig.stationary {
        return if features.distance <= STATIONARY_DISTANCE_THRESHOLD { 1.0 } else { 0.0 };
    }
    let (sx, sy) = sig.direction;
    let (fx, fy) = features.direction;
    let cosine = sx * fx + sy * fy;
    cosine.max(0.0)
}

fn vel_score(sig: &GestureSignature, features: &Features) -> f64 {
    let (lo, hi) = sig.speed_range;
    if features.speed >= lo && features.speed <= hi {
        return 1.0;
    }
    let excess = if features.speed < lo { lo - features.speed } else { features.speed - hi };
    let span = (hi - lo).max(0.1);
    (1.0 - excess / span).max(0.0)
}

fn acc_score(sig: &GestureSignature, features: &Features) -> f64 {
    if sig.acceleration == features.acceleration {
        1.0
    } else {
        0.0
    }
}

/// Raw scores for every signature, normalized to sum to 1 (uniform if every
/// raw score is zero).
///
/// Combines the three sub-scores as a weighted geometric mean
/// (`dir^wDir * vel^wVel * acc^wAcc`) rather than a weighted sum: an
/// arithmetic blend lets a signature whose direction doesn't match at all
/// still collect half its score from a speed/acceleration profile shared by
/// every directional gesture, which leaves the winning signature's share of
/// the normalized distribution too small to clear the prediction thresholds.
/// The product gives a single strongly-mismatched sub-score the weight to
/// zero a signature out, which is what actually separates a confident
/// top candidate from the rest.
fn score_all(features: &Features) -> Vec<(&'static str, f64)> {
    let raw: Vec<(&'static str, f64)> = signatures()
        .iter()
        .map(|sig| {
            let score = dir_score(sig, features).powf(W_DIR) * vel_score(sig, features).powf(W_VEL) * acc_score(sig, features).powf(W_ACC);
            (sig.name, score)
        })
        .collect();

    let sum: f64 = raw.iter().map(|(_, s)| s).sum();
    if sum <= f64::EPSILON {
        let n = raw.len() as f64;
        raw.into_iter().map(|(name, _)| (name, 1.0 / n)).collect()
    } else {
        raw.into_iter().map(|(name, s)| (name, s / sum)).collect()
    }
}

fn prediction_threshold_for(cognitive_state: &str) -> f64 {
    match cognitive_state {
        "frustrated" => 0.60,
        "exploring" => 0.50,
        "concentrated" => 0.75,
        _ => 0.70,
    }
}

fn stable_threshold_for(cognitive_state: &str) -> f64 {
    if cognitive_state == "exploring" {
        0.90
    } else {
        0.95
    }
}

const PRE_RENDER_THRESHOLD: f64 = 0.85;
const PRE_RENDER_FRUSTRATED_BONUS: f64 = 0.10;

/// How far a prediction episode has progressed; monotonic until the buffer
/// is reset (hand lost, or a downstream confirmation after `stable`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Stage {
    None,
    Prediction,
    PreRender,
    Stable,
}

struct PredictorState {
    buffer: VecDeque<HandSample>,
    stage: Stage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentPrediction {
    pub gesture: String,
    pub confidence: f64,
    pub target_card_id: Option<i64>,
    pub trajectory: Option<Vec<(f64, f64)>>,
}

fn target_card_id(gesture: &str, store: &Store<RootState>) -> Option<i64> {
    let state = store.get_state();
    let nav = &state.navigation;
    if nav.total_cards <= 0 {
        return None;
    }
    let delta = match gesture {
        "swipe_right" | "swipe_down" => 1,
        "swipe_left" | "swipe_up" => -1,
        _ => return None,
    };
    let raw = nav.current_card_index + delta;
    Some(if nav.wrapping { raw.rem_euclid(nav.total_cards) } else { raw.clamp(0, nav.total_cards - 1) })
}

/// Push a sample, recompute scores once the buffer has >= 3 samples, and
/// emit whichever stage-transition events are newly reached. Called from
/// the `input:gesture:sample` subscription and directly by tests. Takes an
/// explicit `t_ms` (rather than reading a clock itself) so the scoring path
/// stays a pure function of its inputs and is directly testable with
/// fabricated timing.
fn handle_sample(
    predictor_state: &Arc<Mutex<PredictorState>>,
    event_bus: &Arc<EventBus>,
    store: &Arc<Store<RootState>>,
    buffer_size: usize,
    x: f64,
    y: f64,
    t_ms: u64,
) {
    let buffer_snapshot = {
        let mut state = predictor_state.lock().unwrap();
        if state.buffer.len() >= buffer_size {
            state.buffer.pop_front();
        }
        state.buffer.push_back(HandSample { x, y, t_ms });
        if state.buffer.len() < 3 {
            return;
        }
        state.buffer.clone()
    };

    let features = extract_features(&buffer_snapshot);
    let scores = score_all(&features);
    let (top_gesture, top_confidence) = scores
        .iter()
        .cloned()
        .fold(("", 0.0_f64), |best, (name, score)| if score > best.1 { (name, score) } else { best });

    let cognitive_state = store.get_state().user.cognitive_state.clone().unwrap_or_else(|| "neutral".to_string());
    let prediction_threshold = prediction_threshold_for(&cognitive_state);
    let stable_threshold = stable_threshold_for(&cognitive_state);
    let prerender_score =
        if cognitive_state == "frustrated" { (top_confidence + PRE_RENDER_FRUSTRATED_BONUS).min(1.0) } else { top_confidence };

    let new_stage = if top_confidence >= stable_threshold {
        Stage::Stable
    } else if prerender_score >= PRE_RENDER_THRESHOLD {
        Stage::PreRender
    } else if top_confidence >= prediction_threshold {
        Stage::Prediction
    } else {
        Stage::None
    };

    {
        let mut state = predictor_state.lock().unwrap();
        if new_stage <= state.stage {
            return;
        }
        state.stage = new_stage;
    }

    let trajectory: Vec<(f64, f64)> = buffer_snapshot.iter().map(|s| (s.x, s.y)).collect();
    let target = target_card_id(top_gesture, store);
    let prediction = IntentPrediction {
        gesture: top_gesture.to_string(),
        confidence: top_confidence,
        target_card_id: target,
        trajectory: Some(trajectory),
    };
    let payload = serde_json::to_value(&prediction).expect("IntentPrediction always serializes");

    match new_stage {
        Stage::Prediction => {
            event_bus.emit("intent:prediction", payload);
        }
        Stage::PreRender => {
            event_bus.emit("intent:prediction", payload.clone());
            event_bus.emit("intent:pre_render", payload);
        }
        Stage::Stable => {
            event_bus.emit("intent:prediction", payload.clone());
            event_bus.emit("intent:pre_render", payload.clone());
            event_bus.emit("intent:stable", payload);
        }
        Stage::None => {}
    }
}

pub struct IntentPredictor {
    buffer_size: usize,
    state: Arc<Mutex<PredictorState>>,
    bus: Mutex<Option<Arc<EventBus>>>,
    sample_sub: Mutex<Option<SubscriptionId>>,
    lost_sub: Mutex<Option<SubscriptionId>>,
    confirm_sub: Mutex<Option<SubscriptionId>>,
}

impl IntentPredictor {
    pub fn new(buffer_size: usize) -> Self {
        let capacity = buffer_size.max(3);
        Self {
            buffer_size: capacity,
            state: Arc::new(Mutex::new(PredictorState { buffer: VecDeque::with_capacity(capacity), stage: Stage::None })),
            bus: Mutex::new(None),
            sample_sub: Mutex::new(None),
            lost_sub: Mutex::new(None),
            confirm_sub: Mutex::new(None),
        }
    }

    /// Current trajectory buffer length, for tests/diagnostics.
    pub fn buffer_len(&self) -> usize {
        self.state.lock().unwrap().buffer.len()
    }

    /// Feed one normalized `(x, y)` sample directly, bypassing the bus.
    /// Exercised by tests and usable by an embedder driving the predictor
    /// without an input plugin in between.
    pub fn sample(&self, core: &NavigatorCore, x: f64, y: f64) {
        handle_sample(&self.state, &core.event_bus, &core.store, self.buffer_size, x, y, core.clock().now_ms());
    }

    fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.buffer.clear();
        state.stage = Stage::None;
    }
}

impl Default for IntentPredictor {
    fn default() -> Self {
        Self::new(20)
    }
}

#[async_trait]
impl Plugin for IntentPredictor {
    fn name(&self) -> &str {
        "intent-predictor"
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn init(&self, core: &NavigatorCore) -> Result<(), NavigatorError> {
        let event_bus = core.event_bus.clone();
        let store = core.store.clone();
        let clock = core.clock().clone();
        let buffer_size = self.buffer_size;
        let predictor_state = self.state.clone();

        let bus_for_sample = event_bus.clone();
        let sample_id = event_bus.on(
            "input:gesture:sample",
            move |evt| {
                let x = evt.payload.get("x").and_then(Value::as_f64);
                let y = evt.payload.get("y").and_then(Value::as_f64);
                if let (Some(x), Some(y)) = (x, y) {
                    handle_sample(&predictor_state, &bus_for_sample, &store, buffer_size, x, y, clock.now_ms());
                }
            },
            Default::default(),
        );
        *self.sample_sub.lock().unwrap() = Some(sample_id);

        let reset_on_lost = self.state.clone();
        let lost_id = event_bus.on(
            "input:gesture:lost",
            move |_| {
                let mut state = reset_on_lost.lock().unwrap();
                state.buffer.clear();
                state.stage = Stage::None;
            },
            Default::default(),
        );
        *self.lost_sub.lock().unwrap() = Some(lost_id);

        let reset_on_confirm = self.state.clone();
        let confirm_id = event_bus.on(
            "intent:confirm",
            move |_| {
                let mut state = reset_on_confirm.lock().unwrap();
                state.buffer.clear();
                state.stage = Stage::None;
            },
            Default::default(),
        );
        *self.confirm_sub.lock().unwrap() = Some(confirm_id);
        *self.bus.lock().unwrap() = Some(event_bus);

        Ok(())
    }

    async fn stop(&self) -> Result<(), NavigatorError> {
        self.unsubscribe_all();
        self.reset();
        Ok(())
    }

    async fn destroy(&self) -> Result<(), NavigatorError> {
        self.unsubscribe_all();
        self.reset();
        Ok(())
    }
}

impl IntentPredictor {
    fn unsubscribe_all(&self) {
        let Some(bus) = self.bus.lock().unwrap().take() else {
            return;
        };
        if let Some(id) = self.sample_sub.lock().unwrap().take() {
            bus.unsubscribe(id);
        }
        if let Some(id) = self.lost_sub.lock().unwrap().take() {
            bus.unsubscribe(id);
        }
        if let Some(id) = self.confirm_sub.lock().unwrap().take() {
            bus.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests;
