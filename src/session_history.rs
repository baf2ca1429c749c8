//! Fixed-capacity ring buffer of recorded user actions, plus the rolling
//! metrics the cognitive/intent analyzers poll.
//!
//! Mirrors the bounded-`VecDeque` eviction idiom used by the in-memory log
//! buffer elsewhere in this crate's ambient stack (`logging::LogBuffer`):
//! push to the back, pop from the front once at capacity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single recorded user action. Never mutated after `add`; evicted only
/// by ring-buffer overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    /// Milliseconds since the session's `Clock` origin.
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub action_type: String,
    pub success: bool,
    pub duration_ms: Option<u64>,
    pub start_pos: Option<(f64, f64)>,
    pub end_pos: Option<(f64, f64)>,
}

impl Action {
    pub fn new(id: impl Into<String>, timestamp: u64, action_type: impl Into<String>, success: bool) -> Self {
        Self {
            id: id.into(),
            timestamp,
            action_type: action_type.into(),
            success,
            duration_ms: None,
            start_pos: None,
            end_pos: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_positions(mut self, start: (f64, f64), end: (f64, f64)) -> Self {
        self.start_pos = Some(start);
        self.end_pos = Some(end);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityProfile {
    Slow,
    Medium,
    Fast,
}

/// Rolling metrics over a window of the most recent actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub error_rate: f64,
    pub average_duration_ms: f64,
    pub action_variety: f64,
    pub unique_type_count: usize,
    pub recent_errors: usize,
    pub velocity_profile: VelocityProfile,
    pub sample_size: usize,
}

impl Metrics {
    fn zeroed() -> Self {
        Self {
            error_rate: 0.0,
            average_duration_ms: 0.0,
            action_variety: 0.0,
            unique_type_count: 0,
            recent_errors: 0,
            velocity_profile: VelocityProfile::Medium,
            sample_size: 0,
        }
    }
}

/// `getErrorClusters` result: consecutive failures grouped by inter-arrival
/// gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorClusters {
    pub max_cluster_size: usize,
    pub average_cluster_size: f64,
    pub total_clusters: usize,
}

impl ErrorClusters {
    fn zeroed() -> Self {
        Self {
            max_cluster_size: 0,
            average_cluster_size: 0.0,
            total_clusters: 0,
        }
    }
}

pub struct UserSessionHistory {
    capacity: usize,
    buffer: VecDeque<Action>,
}

impl UserSessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffer: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// O(1): push to the back, evict the oldest when at capacity.
    pub fn add(&mut self, action: Action) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(action);
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Last `n` actions, oldest first.
    pub fn get_latest(&self, n: usize) -> Vec<Action> {
        let start = self.buffer.len().saturating_sub(n);
        self.buffer.iter().skip(start).cloned().collect()
    }

    /// Metrics over the last `min(window_size, size())` actions. Never
    /// panics on an empty buffer.
    pub fn get_metrics(&self, window_size: usize) -> Metrics {
        if self.buffer.is_empty() {
            return Metrics::zeroed();
        }

        let window = self.get_latest(window_size.min(self.buffer.len()));
        let total = window.len();
        if total == 0 {
            return Metrics::zeroed();
        }

        let failed = window.iter().filter(|a| !a.success).count();
        let error_rate = failed as f64 / total as f64;

        let durations: Vec<u64> = window.iter().filter_map(|a| a.duration_ms).collect();
        let average_duration_ms = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<u64>() as f64 / durations.len() as f64
        };

        let unique_types: std::collections::HashSet<&str> =
            window.iter().map(|a| a.action_type.as_str()).collect();
        let unique_type_count = unique_types.len();
        let action_variety = unique_type_count as f64 / total as f64;

        let recent_window = window.len().min(5);
        let recent_errors = window[window.len() - recent_window..]
            .iter()
            .filter(|a| !a.success)
            .count();

        let velocity_profile = if average_duration_ms >= 600.0 {
            VelocityProfile::Slow
        } else if average_duration_ms <= 400.0 && !durations.is_empty() {
            VelocityProfile::Fast
        } else {
            VelocityProfile::Medium
        };

        Metrics {
            error_rate,
            average_duration_ms,
            action_variety,
            unique_type_count,
            recent_errors,
            velocity_profile,
            sample_size: total,
        }
    }

    /// Group consecutive failing actions whose inter-arrival gap is within
    /// `time_window_ms` into clusters. A success (or a gap larger than the
    /// window) ends the current cluster.
    pub fn get_error_clusters(&self, time_window_ms: u64) -> ErrorClusters {
        if self.buffer.is_empty() {
            return ErrorClusters::zeroed();
        }

        let mut clusters: Vec<usize> = Vec::new();
        let mut current: usize = 0;
        let mut last_failure_ts: Option<u64> = None;

        for action in &self.buffer {
            if action.success {
                if current > 0 {
                    clusters.push(current);
                }
                current = 0;
                last_failure_ts = None;
                continue;
            }

            match last_failure_ts {
                Some(last) if action.timestamp.saturating_sub(last) <= time_window_ms => {
                    current += 1;
                }
                _ => {
                    if current > 0 {
                        clusters.push(current);
                    }
                    current = 1;
                }
            }
            last_failure_ts = Some(action.timestamp);
        }
        if current > 0 {
            clusters.push(current);
        }

        if clusters.is_empty() {
            return ErrorClusters::zeroed();
        }

        let max_cluster_size = *clusters.iter().max().unwrap();
        let average_cluster_size = clusters.iter().sum::<usize>() as f64 / clusters.len() as f64;

        ErrorClusters {
            max_cluster_size,
            average_cluster_size,
            total_clusters: clusters.len(),
        }
    }
}

#[cfg(test)]
mod tests;
