use super::*;
use crate::clock::Clock;
use std::sync::atomic::{AtomicU32, Ordering};

fn state() -> AppState {
    AppState::new(
        Arc::new(EventBus::new(Clock::new())),
        serde_json::json!({"navigation": {"currentCardIndex": 0}, "ui": {"theme": "dark"}}),
    )
}

#[test]
fn get_reads_dot_path_with_default_fallback() {
    let s = state();
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(0));
    assert_eq!(s.get("nope.nothing", Some(serde_json::json!("fallback"))), serde_json::json!("fallback"));
}

#[test]
fn set_path_deep_merges_and_preserves_siblings() {
    let s = state();
    s.set_path("navigation.currentCardIndex", serde_json::json!(3), SetStateOptions::merged());
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(3));
    assert_eq!(s.get("ui.theme", None), serde_json::json!("dark"));
}

#[test]
fn set_partial_without_merge_replaces_slice_wholesale() {
    let s = state();
    s.set_partial(
        serde_json::json!({"navigation": {"currentCardIndex": 9}}),
        SetStateOptions {
            silent: false,
            merge: false,
            source: None,
        },
    );
    // Replacement of the "navigation" key entirely: the slice becomes
    // exactly the partial's value, dropping any other navigation fields.
    assert_eq!(s.get("navigation", None), serde_json::json!({"currentCardIndex": 9}));
}

#[test]
fn silent_update_suppresses_bus_events() {
    let bus = Arc::new(EventBus::new(Clock::new()));
    let s = AppState::new(bus.clone(), serde_json::json!({"a": 1}));
    let fired = Arc::new(AtomicU32::new(0));
    let f = fired.clone();
    bus.on("state:changed", move |_| { f.fetch_add(1, Ordering::SeqCst); }, Default::default());

    s.set_partial(serde_json::json!({"a": 2}), SetStateOptions { silent: true, merge: true, source: None });
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(s.get("a", None), serde_json::json!(2));
}

#[test]
fn setstate_emits_changed_then_per_key_then_computed() {
    let bus = Arc::new(EventBus::new(Clock::new()));
    let s = AppState::new(bus.clone(), serde_json::json!({"navigation": {}}));
    let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    for (name, tag) in [
        ("state:changed", "changed"),
        ("state:navigation:changed", "nav"),
        ("state:computed:updated", "computed"),
    ] {
        let o = order.clone();
        bus.on(name, move |_| o.lock().unwrap().push(tag), Default::default());
    }

    s.set_partial(serde_json::json!({"navigation": {"currentCardIndex": 1}}), SetStateOptions::merged());
    assert_eq!(*order.lock().unwrap(), vec!["changed", "nav", "computed"]);
}

#[test]
fn sync_watcher_on_prefix_path_fires_with_prev_and_current() {
    let s = state();
    let seen = Arc::new(Mutex::new(None));
    let seen2 = seen.clone();
    let _handle = s.watch("navigation.currentCardIndex", WatchMode::Sync, move |curr, prev| {
        *seen2.lock().unwrap() = Some((curr.clone(), prev.clone()));
    });

    s.set_path("navigation.currentCardIndex", serde_json::json!(7), SetStateOptions::merged());
    let (curr, prev) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(curr, serde_json::json!(7));
    assert_eq!(prev, serde_json::json!(0));
}

#[test]
fn watcher_outside_path_does_not_fire() {
    let s = state();
    let fired = Arc::new(AtomicU32::new(0));
    let f = fired.clone();
    let _handle = s.watch("ui.theme", WatchMode::Sync, move |_, _| { f.fetch_add(1, Ordering::SeqCst); });

    s.set_path("navigation.currentCardIndex", serde_json::json!(1), SetStateOptions::merged());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn unwatch_stops_future_notifications() {
    let s = state();
    let fired = Arc::new(AtomicU32::new(0));
    let f = fired.clone();
    let handle = s.watch("navigation", WatchMode::Sync, move |_, _| { f.fetch_add(1, Ordering::SeqCst); });

    s.set_path("navigation.currentCardIndex", serde_json::json!(1), SetStateOptions::merged());
    handle.unwatch();
    s.set_path("navigation.currentCardIndex", serde_json::json!(2), SetStateOptions::merged());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn same_watcher_notified_once_per_setstate_even_with_multiple_matching_keys() {
    let s = state();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _handle = s.watch("navigation", WatchMode::Sync, move |_, _| { c.fetch_add(1, Ordering::SeqCst); });

    s.set_partial(
        serde_json::json!({"navigation": {"currentCardIndex": 1}, "ui": {"theme": "light"}}),
        SetStateOptions::merged(),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn history_and_time_travel_restore_prior_snapshot() {
    let s = state();
    s.set_path("navigation.currentCardIndex", serde_json::json!(1), SetStateOptions::merged());
    s.set_path("navigation.currentCardIndex", serde_json::json!(2), SetStateOptions::merged());
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(2));

    assert!(s.time_travel(1));
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(1));
}

#[test]
fn time_travel_out_of_range_is_a_no_op() {
    let s = state();
    assert!(!s.time_travel(1));
}

#[test]
fn reset_restores_default_snapshot() {
    let s = state();
    s.set_path("navigation.currentCardIndex", serde_json::json!(5), SetStateOptions::merged());
    s.reset(true);
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(0));
}

#[test]
fn persist_and_restore_round_trip() {
    let dir = std::env::temp_dir().join(format!("navigator-appstate-test-{}", std::process::id()));
    let s = AppState::with_persistence(
        Arc::new(EventBus::new(Clock::new())),
        serde_json::json!({"navigation": {"currentCardIndex": 0}}),
        PersistenceBackend::new(dir.clone()),
    );
    s.set_path("navigation.currentCardIndex", serde_json::json!(4), SetStateOptions::merged());
    s.persist("session").unwrap();

    let s2 = AppState::with_persistence(
        Arc::new(EventBus::new(Clock::new())),
        serde_json::json!({"navigation": {"currentCardIndex": 0}}),
        PersistenceBackend::new(dir.clone()),
    );
    s2.restore("session").unwrap();
    assert_eq!(s2.get("navigation.currentCardIndex", None), serde_json::json!(4));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn restore_missing_key_leaves_state_untouched() {
    let s = state();
    s.restore("never-persisted-key").unwrap();
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(0));
}

#[tokio::test]
async fn debounced_watcher_coalesces_a_burst_into_one_call() {
    let s = state();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _handle = s.watch(
        "navigation.currentCardIndex",
        WatchMode::Debounce(std::time::Duration::from_millis(20)),
        move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        },
    );

    for i in 1..=5 {
        s.set_path("navigation.currentCardIndex", serde_json::json!(i), SetStateOptions::merged());
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0, "debounce window has not elapsed yet");

    tokio::time::sleep(std::time::Duration::from_millis(40)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(s.get("navigation.currentCardIndex", None), serde_json::json!(5));
}
