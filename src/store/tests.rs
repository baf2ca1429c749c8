use super::*;
use crate::store::actions::{navigate, Direction, InputSource};
use crate::store::reducers::{root_reducer, NavigationState, RootState};
use std::sync::atomic::{AtomicU32, Ordering};

fn navigable_store() -> Store<RootState> {
    Store::new(
        root_reducer(),
        RootState {
            navigation: NavigationState { current_card_index: 0, total_cards: 5, wrapping: false, ..Default::default() },
            ..Default::default()
        },
    )
}

#[test]
fn dispatch_requires_non_empty_type() {
    let store = navigable_store();
    let result = store.dispatch(StoreAction::new("", serde_json::json!({})));
    assert!(matches!(result, Err(NavigatorError::DispatchMissingType)));
}

#[test]
fn dispatch_updates_state_and_returns_the_action() {
    let store = navigable_store();
    let action = store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    assert_eq!(action.type_, "NAVIGATE");
    assert_eq!(store.get_state().navigation.current_card_index, 1);
}

#[test]
fn unmatched_action_leaves_state_reference_equal() {
    let store = navigable_store();
    let before = store.get_state();
    store.dispatch(StoreAction::new("NOOP", serde_json::json!({}))).unwrap();
    let after = store.get_state();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn subscribers_notified_after_reducer_completes() {
    let store = navigable_store();
    let seen_index = Arc::new(AtomicU32::new(99));
    let seen = seen_index.clone();
    let store = Arc::new(store);
    let s2 = store.clone();
    store.subscribe(move || {
        seen.store(s2.get_state().navigation.current_card_index as u32, Ordering::SeqCst);
    });

    store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    assert_eq!(seen_index.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_stops_further_notifications() {
    let store = navigable_store();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let id = store.subscribe(move || { c.fetch_add(1, Ordering::SeqCst); });

    store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    store.unsubscribe(id);
    store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn middleware_can_cancel_dispatch() {
    let store = navigable_store();
    store.use_middleware(Arc::new(|_state, _action| None));
    let before = store.get_state();
    store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    assert!(Arc::ptr_eq(&before, &store.get_state()));
}

#[test]
fn middleware_can_transform_action_before_reducer_runs() {
    let store = navigable_store();
    store.use_middleware(Arc::new(|_state, action| {
        let mut a = action.clone();
        a.payload["direction"] = serde_json::json!("left");
        Some(a)
    }));
    store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    // total_cards=5, wrapping=false, start 0, rewritten to "left" clamps at 0
    assert_eq!(store.get_state().navigation.current_card_index, 0);
}

#[test]
fn dispatch_hook_observes_prior_and_next_state() {
    let mut store = navigable_store();
    let observed = Arc::new(Mutex::new(None));
    let o = observed.clone();
    store.set_dispatch_hook(Arc::new(move |action, prior, next| {
        *o.lock().unwrap() = Some((action.type_.clone(), prior.navigation.current_card_index, next.navigation.current_card_index));
    }));

    store.dispatch(navigate(Direction::Right, InputSource::Keyboard)).unwrap();
    let (ty, prior_idx, next_idx) = observed.lock().unwrap().clone().unwrap();
    assert_eq!(ty, "NAVIGATE");
    assert_eq!(prior_idx, 0);
    assert_eq!(next_idx, 1);
}
