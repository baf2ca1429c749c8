use super::*;
use crate::core::{NavigatorCore, NavigatorCoreOptions};
use crate::event_bus::SubscribeOptions;
use std::sync::atomic::{AtomicU32, Ordering};

fn buffer_from(points: &[(f64, f64, u64)]) -> VecDeque<HandSample> {
    points.iter().map(|&(x, y, t_ms)| HandSample { x, y, t_ms }).collect()
}

#[test]
fn rightward_accelerating_trajectory_scores_swipe_right_highest() {
    // Matches the spec's seed scenario: (0.2, 0.5) -> (0.7, 0.51) over 250ms,
    // accelerating (later segments faster than earlier ones).
    let buffer = buffer_from(&[(0.20, 0.50, 0), (0.30, 0.505, 150), (0.70, 0.51, 250)]);
    let features = extract_features(&buffer);
    assert_eq!(features.acceleration, AccelerationPattern::Accelerating);

    let scores = score_all(&features);
    let (top_gesture, top_confidence) =
        scores.iter().cloned().fold(("", 0.0_f64), |best, (n, s)| if s > best.1 { (n, s) } else { best });
    assert_eq!(top_gesture, "swipe_right");
    assert!(top_confidence >= 0.70, "expected >= 0.70, got {top_confidence}");
}

#[test]
fn stationary_trajectory_scores_point_or_pinch_highest() {
    // Displacement from the first to the last sample is exactly zero, so
    // direction collapses to (0, 0) rather than an accidental heading.
    let buffer = buffer_from(&[(0.50, 0.50, 0), (0.502, 0.501, 50), (0.50, 0.50, 100)]);
    let features = extract_features(&buffer);
    let scores = score_all(&features);
    let (top_gesture, _) = scores.iter().cloned().fold(("", 0.0_f64), |best, (n, s)| if s > best.1 { (n, s) } else { best });
    assert!(top_gesture == "point" || top_gesture == "pinch");
}

#[test]
fn scores_normalize_to_a_probability_distribution() {
    let buffer = buffer_from(&[(0.1, 0.5, 0), (0.4, 0.5, 100), (0.9, 0.5, 200)]);
    let features = extract_features(&buffer);
    let scores = score_all(&features);
    let sum: f64 = scores.iter().map(|(_, s)| s).sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn vel_score_is_full_within_range_and_decays_outside() {
    let sig = &signatures()[1]; // swipe_right
    let in_range = Features { direction: (1.0, 0.0), distance: 0.5, speed: 2.0, acceleration: AccelerationPattern::Accelerating };
    assert_eq!(vel_score(sig, &in_range), 1.0);

    let way_too_fast = Features { direction: (1.0, 0.0), distance: 0.5, speed: 50.0, acceleration: AccelerationPattern::Accelerating };
    assert_eq!(vel_score(sig, &way_too_fast), 0.0);
}

#[test]
fn dir_score_rewards_aligned_direction_and_penalizes_opposite() {
    let sig = &signatures()[1]; // swipe_right, direction (1, 0)
    let aligned = Features { direction: (1.0, 0.0), distance: 0.5, speed: 2.0, acceleration: AccelerationPattern::Accelerating };
    let opposite = Features { direction: (-1.0, 0.0), distance: 0.5, speed: 2.0, acceleration: AccelerationPattern::Accelerating };
    assert_eq!(dir_score(sig, &aligned), 1.0);
    assert_eq!(dir_score(sig, &opposite), 0.0);
}

#[tokio::test]
async fn end_to_end_trajectory_crosses_prediction_then_stable() {
    let core = NavigatorCore::new(NavigatorCoreOptions::default());
    let predictor = IntentPredictor::new(20);
    predictor.init(&core).await.unwrap();

    let prediction_count = Arc::new(AtomicU32::new(0));
    let stable_count = Arc::new(AtomicU32::new(0));
    let p = prediction_count.clone();
    let s = stable_count.clone();
    core.event_bus.on("intent:prediction", move |_| { p.fetch_add(1, Ordering::SeqCst); }, SubscribeOptions::default());
    core.event_bus.on("intent:stable", move |_| { s.fetch_add(1, Ordering::SeqCst); }, SubscribeOptions::default());

    // Directly seed the buffer with a strongly accelerating rightward
    // trajectory using fabricated timestamps (the plugin's own `sample`
    // reads the wall clock, which is too fast-moving in a test to control).
    let frames: &[(f64, f64, u64)] = &[
        (0.10, 0.50, 0),
        (0.20, 0.50, 100),
        (0.45, 0.50, 175),
        (0.90, 0.50, 225),
    ];
    for &(x, y, t_ms) in frames {
        handle_sample(&predictor.state, &core.event_bus, &core.store, predictor.buffer_size, x, y, t_ms);
    }

    assert!(prediction_count.load(Ordering::SeqCst) >= 1);
    assert!(stable_count.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn hand_lost_resets_the_buffer() {
    let core = NavigatorCore::new(NavigatorCoreOptions::default());
    let predictor = IntentPredictor::new(20);
    predictor.init(&core).await.unwrap();

    predictor.sample(&core, 0.2, 0.5);
    predictor.sample(&core, 0.3, 0.5);
    predictor.sample(&core, 0.4, 0.5);
    assert_eq!(predictor.buffer_len(), 3);

    core.event_bus.emit("input:gesture:lost", serde_json::json!({}));
    assert_eq!(predictor.buffer_len(), 0);
}

#[tokio::test]
async fn destroy_unsubscribes_from_the_bus() {
    let core = NavigatorCore::new(NavigatorCoreOptions::default());
    let predictor = IntentPredictor::new(20);
    predictor.init(&core).await.unwrap();
    predictor.destroy().await.unwrap();

    let delivered = Arc::new(AtomicU32::new(0));
    let d = delivered.clone();
    core.event_bus.on(
        "intent:prediction",
        move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        },
        SubscribeOptions::default(),
    );

    // Post-destroy samples must not feed a dead subscription; the handler
    // above only observes handlers registered fresh after destroy, so this
    // just asserts the predictor's own subscriptions are gone via stats.
    let stats_before = core.event_bus.get_stats().counts.get("input:gesture:sample").copied().unwrap_or(0);
    core.event_bus.emit("input:gesture:sample", serde_json::json!({"x": 0.5, "y": 0.5}));
    let stats_after = core.event_bus.get_stats().counts.get("input:gesture:sample").copied().unwrap_or(0);
    assert_eq!(stats_after, stats_before + 1); // emit still recorded...
    assert_eq!(delivered.load(Ordering::SeqCst), 0); // ...but nothing downstream fired from the predictor.
}
