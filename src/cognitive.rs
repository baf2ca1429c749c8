//! CognitiveModel analyzer plugin: polls `UserSessionHistory` on a fixed
//! interval, accumulates per-signal votes across cycles, and emits a state
//! transition once a signal crosses its vote threshold.
//!
//! Runs its polling loop as a single `tokio::spawn`ed task holding its own
//! local vote/state — simpler than sharing that state behind a `Mutex`,
//! since nothing outside the loop ever needs to read it directly.

use crate::core::NavigatorCore;
use crate::error::NavigatorError;
use crate::plugin::Plugin;
use crate::session_history::Action;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Priority order a vote can transition into; checked in this order so
/// `frustrated` wins ties over `concentrated`, etc.
const SIGNAL_PRIORITY: [&str; 4] = ["frustrated", "concentrated", "learning", "exploring"];

/// A cognitive-state transition, emitted as the `cognitive_state:change`
/// payload. Mirrors `event_bus::NavigatorEvent` and `session_history::Action`
/// in being a typed record rather than an ad hoc JSON literal, per the data
/// model's `CognitiveState transition` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CognitiveTransition {
    pub from: String,
    pub to: String,
    pub confidence: f64,
    pub signals: HashMap<&'static str, bool>,
    pub timestamp_ms: u64,
}

pub struct CognitiveModel {
    interval_ms: u64,
    vote_threshold: u32,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl CognitiveModel {
    pub fn new(interval_ms: u64, vote_threshold: u32) -> Self {
        Self {
            interval_ms,
            vote_threshold,
            task: Mutex::new(None),
        }
    }
}

impl Default for CognitiveModel {
    fn default() -> Self {
        Self::new(500, 3)
    }
}

fn success_rate(actions: &[Action]) -> f64 {
    if actions.is_empty() {
        return 0.0;
    }
    let successes = actions.iter().filter(|a| a.success).count();
    successes as f64 / actions.len() as f64
}

#[async_trait]
impl Plugin for CognitiveModel {
    fn name(&self) -> &str {
        "cognitive-model"
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn init(&self, core: &NavigatorCore) -> Result<(), NavigatorError> {
        let history = core.history_handle();
        let event_bus = core.event_bus.clone();
        let store = core.store.clone();
        let clock = core.clock().clone();
        let interval_ms = self.interval_ms;
        let threshold = self.vote_threshold;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            let mut votes: HashMap<&'static str, u32> = HashMap::new();
            let mut current_state = "neutral".to_string();

            loop {
                ticker.tick().await;

                let (metrics10, clusters, window20) = {
                    let history = history.lock().unwrap();
                    (history.get_metrics(10), history.get_error_clusters(5000), history.get_latest(20))
                };

                let frustrated = metrics10.error_rate > 0.40 || clusters.max_cluster_size >= 3;
                let concentrated = metrics10.average_duration_ms < 400.0 && metrics10.error_rate < 0.10;
                let exploring = metrics10.action_variety > 0.60 && (0.10..=0.40).contains(&metrics10.error_rate);
                let learning = if window20.len() < 20 {
                    false
                } else {
                    let half = window20.len() / 2;
                    success_rate(&window20[half..]) - success_rate(&window20[..half]) >= 0.15
                };

                let satisfied: HashMap<&'static str, bool> = HashMap::from([
                    ("frustrated", frustrated),
                    ("concentrated", concentrated),
                    ("exploring", exploring),
                    ("learning", learning),
                ]);

                for signal in SIGNAL_PRIORITY {
                    let entry = votes.entry(signal).or_insert(0);
                    if satisfied[signal] {
                        *entry += 1;
                    } else {
                        *entry = 0;
                    }
                }

                let winner = SIGNAL_PRIORITY.into_iter().find(|s| votes.get(s).copied().unwrap_or(0) >= threshold);

                if let Some(to) = winner {
                    if to != current_state {
                        let vote = votes[to];
                        let confidence = (vote as f64 / (threshold as f64 * 1.5)).min(1.0);
                        let transition = CognitiveTransition {
                            from: current_state.clone(),
                            to: to.to_string(),
                            confidence,
                            signals: satisfied,
                            timestamp_ms: clock.now_ms(),
                        };
                        event_bus.emit(
                            "cognitive_state:change",
                            serde_json::to_value(&transition).expect("CognitiveTransition always serializes"),
                        );
                        event_bus.emit(&format!("cognitive_state:{to}"), serde_json::json!({ "confidence": confidence }));
                        let _ = store.dispatch(crate::store::actions::set_cognitive_state(to));
                        current_state = to.to_string();
                    }
                }
            }
        });

        *self.task.lock().unwrap() = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), NavigatorError> {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), NavigatorError> {
        self.stop().await
    }
}
