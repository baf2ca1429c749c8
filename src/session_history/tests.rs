use super::*;

fn action(id: &str, ts: u64, ty: &str, success: bool) -> Action {
    Action::new(id, ts, ty, success)
}

#[test]
fn ring_buffer_evicts_oldest_when_full() {
    let mut h = UserSessionHistory::new(3);
    for i in 0..5 {
        h.add(action(&i.to_string(), i as u64, "intent:navigate_left", true));
    }
    assert_eq!(h.size(), 3);
    let latest = h.get_latest(10);
    assert_eq!(latest.iter().map(|a| a.id.clone()).collect::<Vec<_>>(), vec!["2", "3", "4"]);
}

#[test]
fn empty_history_returns_zeroed_metrics() {
    let h = UserSessionHistory::new(10);
    let m = h.get_metrics(10);
    assert_eq!(m.sample_size, 0);
    assert_eq!(m.error_rate, 0.0);
    assert_eq!(m.average_duration_ms, 0.0);

    let c = h.get_error_clusters(1000);
    assert_eq!(c.total_clusters, 0);
    assert_eq!(c.max_cluster_size, 0);
}

#[test]
fn metrics_compute_error_rate_and_variety() {
    let mut h = UserSessionHistory::new(20);
    for i in 0..10 {
        let success = i % 2 == 0;
        h.add(action(&i.to_string(), i as u64 * 100, "intent:navigate_left", success).with_duration(300));
    }
    let m = h.get_metrics(10);
    assert_eq!(m.sample_size, 10);
    assert!((m.error_rate - 0.5).abs() < 1e-9);
    assert_eq!(m.unique_type_count, 1);
    assert!((m.action_variety - 0.1).abs() < 1e-9);
    assert_eq!(m.velocity_profile, VelocityProfile::Fast);
}

#[test]
fn recent_errors_counts_last_five_of_window() {
    let mut h = UserSessionHistory::new(20);
    // First 5 all succeed, last 5 all fail.
    for i in 0..5 {
        h.add(action(&format!("ok{i}"), i as u64, "t", true));
    }
    for i in 0..5 {
        h.add(action(&format!("bad{i}"), 5 + i as u64, "t", false));
    }
    let m = h.get_metrics(10);
    assert_eq!(m.recent_errors, 5);
}

#[test]
fn error_clusters_group_consecutive_failures_within_window() {
    let mut h = UserSessionHistory::new(20);
    // Cluster of 3 failures close together, then a success, then a single
    // failure far away (outside the window from the previous group).
    h.add(action("a", 0, "t", false));
    h.add(action("b", 100, "t", false));
    h.add(action("c", 150, "t", false));
    h.add(action("d", 200, "t", true));
    h.add(action("e", 5000, "t", false));

    let clusters = h.get_error_clusters(500);
    assert_eq!(clusters.total_clusters, 2);
    assert_eq!(clusters.max_cluster_size, 3);
    assert!((clusters.average_cluster_size - 2.0).abs() < 1e-9);
}

#[test]
fn velocity_profile_thresholds() {
    let mut slow = UserSessionHistory::new(5);
    slow.add(action("a", 0, "t", true).with_duration(700));
    assert_eq!(slow.get_metrics(5).velocity_profile, VelocityProfile::Slow);

    let mut fast = UserSessionHistory::new(5);
    fast.add(action("a", 0, "t", true).with_duration(100));
    assert_eq!(fast.get_metrics(5).velocity_profile, VelocityProfile::Fast);

    let mut medium = UserSessionHistory::new(5);
    medium.add(action("a", 0, "t", true).with_duration(500));
    assert_eq!(medium.get_metrics(5).velocity_profile, VelocityProfile::Medium);
}
