use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn bus() -> EventBus {
    EventBus::new(Clock::new())
}

#[test]
fn emit_delivers_to_specific_then_wildcard() {
    let bus = bus();
    let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    let o1 = order.clone();
    bus.on(
        "intent:select",
        move |_| o1.lock().unwrap().push("specific"),
        SubscribeOptions::default(),
    );
    let o2 = order.clone();
    bus.on(
        "*",
        move |_| o2.lock().unwrap().push("wildcard"),
        SubscribeOptions::default(),
    );

    assert!(bus.emit("intent:select", serde_json::json!({})));
    assert_eq!(*order.lock().unwrap(), vec!["specific", "wildcard"]);
}

#[test]
fn priority_runs_higher_first_ties_by_insertion() {
    let bus = bus();
    let order = Arc::new(Mutex::new(Vec::<i32>::new()));

    for (priority, tag) in [(0, 1), (10, 2), (10, 3), (-5, 4)] {
        let o = order.clone();
        bus.on(
            "x",
            move |_| o.lock().unwrap().push(tag),
            SubscribeOptions { once: false, priority },
        );
    }

    bus.emit("x", serde_json::json!({}));
    assert_eq!(*order.lock().unwrap(), vec![2, 3, 1, 4]);
}

#[test]
fn once_auto_unsubscribes() {
    let bus = bus();
    let count = Arc::new(AtomicU32::new(0));
    let c = count.clone();
    bus.once("x", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    bus.emit("x", serde_json::json!({}));
    bus.emit("x", serde_json::json!({}));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_stops_delivery() {
    let bus = bus();
    let count = Arc::new(AtomicU32::new(0));
    let c = count.clone();
    let id = bus.on("x", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    }, SubscribeOptions::default());

    bus.emit("x", serde_json::json!({}));
    bus.unsubscribe(id);
    bus.emit("x", serde_json::json!({}));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn handlers_added_during_emit_do_not_see_that_emit() {
    let bus = Arc::new(bus());
    let seen = Arc::new(AtomicU32::new(0));

    let bus_clone = bus.clone();
    let seen_clone = seen.clone();
    bus.on(
        "x",
        move |_| {
            let seen2 = seen_clone.clone();
            bus_clone.on(
                "x",
                move |_| {
                    seen2.fetch_add(1, Ordering::SeqCst);
                },
                SubscribeOptions::default(),
            );
        },
        SubscribeOptions::default(),
    );

    bus.emit("x", serde_json::json!({}));
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    bus.emit("x", serde_json::json!({}));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn handler_panic_is_isolated_and_reemitted_as_system_error() {
    let bus = bus();
    let ran = Arc::new(AtomicU32::new(0));
    let got_error = Arc::new(AtomicU32::new(0));

    bus.on("x", |_| panic!("boom"), SubscribeOptions::default());
    let r = ran.clone();
    bus.on(
        "x",
        move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        },
        SubscribeOptions::default(),
    );
    let g = got_error.clone();
    bus.on(
        "system:error",
        move |_| {
            g.fetch_add(1, Ordering::SeqCst);
        },
        SubscribeOptions::default(),
    );

    bus.emit("x", serde_json::json!({}));
    assert_eq!(ran.load(Ordering::SeqCst), 1, "other handlers still ran");
    assert_eq!(got_error.load(Ordering::SeqCst), 1);
}

#[test]
fn system_error_handler_panic_does_not_recurse() {
    let bus = bus();
    let panics = Arc::new(AtomicU32::new(0));
    let p = panics.clone();
    bus.on(
        "system:error",
        move |_| {
            p.fetch_add(1, Ordering::SeqCst);
            panic!("also boom");
        },
        SubscribeOptions::default(),
    );

    bus.on("x", |_| panic!("boom"), SubscribeOptions::default());
    bus.emit("x", serde_json::json!({}));
    // system:error fired once for x's panic; its own panic must not
    // trigger a second system:error emission.
    assert_eq!(panics.load(Ordering::SeqCst), 1);
}

#[test]
fn circuit_breaker_trips_on_max_call_depth() {
    let bus = Arc::new(bus());
    bus.set_breaker_limits(10, 50);

    let bus_clone = bus.clone();
    bus.on(
        "x",
        move |_| {
            bus_clone.emit("x", serde_json::json!({}));
        },
        SubscribeOptions::default(),
    );

    let tripped = Arc::new(AtomicU32::new(0));
    let t = tripped.clone();
    bus.on(
        "system:circuit-breaker",
        move |evt| {
            if evt.payload["type"] == "max_depth_exceeded" {
                t.fetch_add(1, Ordering::SeqCst);
            }
        },
        SubscribeOptions::default(),
    );

    let result = bus.emit("x", serde_json::json!({}));
    assert!(result, "outermost emit still delivered to its own handlers");
    assert!(tripped.load(Ordering::SeqCst) >= 1);
}

#[test]
fn middleware_cancelling_returns_false_and_blocks_handlers() {
    let bus = bus();
    bus.use_middleware(|_evt| None);
    let ran = Arc::new(AtomicU32::new(0));
    let r = ran.clone();
    bus.on(
        "x",
        move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        },
        SubscribeOptions::default(),
    );

    assert!(!bus.emit("x", serde_json::json!({})));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn middleware_can_rewrite_payload() {
    let bus = bus();
    bus.use_middleware(|mut evt| {
        evt.payload["tagged"] = serde_json::json!(true);
        Some(evt)
    });
    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    bus.on(
        "x",
        move |evt| {
            *s.lock().unwrap() = Some(evt.payload.clone());
        },
        SubscribeOptions::default(),
    );
    bus.emit("x", serde_json::json!({}));
    assert_eq!(seen.lock().unwrap().as_ref().unwrap()["tagged"], serde_json::json!(true));
}

#[test]
fn history_and_stats_track_emissions() {
    let bus = bus();
    bus.emit("a", serde_json::json!({}));
    bus.emit("a", serde_json::json!({}));
    bus.emit("b", serde_json::json!({}));

    let history = bus.get_history(Some("a"), 50);
    assert_eq!(history.len(), 2);

    let stats = bus.get_stats();
    assert_eq!(stats.total_events, 3);
    assert_eq!(*stats.counts.get("a").unwrap(), 2);
    assert_eq!(stats.top(1)[0].0, "a");
}

#[test]
fn clear_removes_handlers_then_emit_reaches_nobody() {
    let bus = bus();
    let ran = Arc::new(AtomicU32::new(0));
    let r = ran.clone();
    bus.on(
        "x",
        move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        },
        SubscribeOptions::default(),
    );

    bus.clear();
    assert!(!bus.emit("x", serde_json::json!({})));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wait_for_resolves_on_next_matching_emit() {
    let bus = Arc::new(bus());
    let bus2 = bus.clone();
    let handle = tokio::spawn(async move { bus2.wait_for("intent:select", None).await });

    tokio::task::yield_now().await;
    bus.emit("intent:select", serde_json::json!({"source": "keyboard"}));

    let evt = handle.await.unwrap().unwrap();
    assert_eq!(evt.source, "keyboard");
}

#[tokio::test]
async fn wait_for_times_out() {
    let bus = bus();
    let result = bus.wait_for("never", Some(Duration::from_millis(10))).await;
    assert!(result.is_err());
}
