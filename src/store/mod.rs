//! Redux/Elm-inspired centralized state container.
//!
//! Generalizes the example pack's `tui-dispatch-core` `Store`/reducer
//! architecture: `RootState` is held behind an `Arc`, and reducers return
//! the *same* `Arc` (checked with `Arc::ptr_eq`) when an action produces no
//! change — the direct Rust analog of Redux's "same reference when
//! unchanged" contract, with no deep-equality pass required.
//!
//! Middleware here is a cancel-or-transform filter applied before the
//! reducer runs (mirroring `event_bus`'s `Middleware`), not a full
//! continuation-passing "next()" chain: every contract requirement this
//! crate has to satisfy (filter, transform, mirror to the bus) fits that
//! shape, and it avoids self-referential recursive closures that don't
//! translate cleanly to Rust's ownership model. The `action:dispatched`
//! mirror specifically needs pre/post state, which a pre-reducer filter
//! can't see, so it is wired as a dedicated post-dispatch hook instead.

pub mod actions;
pub mod reducers;

pub use actions::StoreAction;
pub use reducers::RootState;

use crate::error::NavigatorError;
use std::sync::{Arc, Mutex};

pub type Reducer<S> = Arc<dyn Fn(&Arc<S>, &StoreAction) -> Arc<S> + Send + Sync>;
pub type Middleware<S> = Arc<dyn Fn(&Arc<S>, &StoreAction) -> Option<StoreAction> + Send + Sync>;
pub type DispatchHook<S> = Arc<dyn Fn(&StoreAction, &Arc<S>, &Arc<S>) + Send + Sync>;
type Listener = Arc<dyn Fn() + Send + Sync>;

/// One slice's worth of reduction logic: reads and writes only its own
/// field of `S`, returns whether it changed anything.
pub struct SliceReducer<S> {
    pub name: &'static str,
    reduce: Box<dyn Fn(&mut S, &StoreAction) -> bool + Send + Sync>,
}

impl<S> SliceReducer<S> {
    pub fn new<F>(name: &'static str, reduce: F) -> Self
    where
        F: Fn(&mut S, &StoreAction) -> bool + Send + Sync + 'static,
    {
        Self { name, reduce: Box::new(reduce) }
    }
}

/// Compose slice reducers into a root reducer. Returns the same `Arc` when
/// no slice reports a change.
pub fn combine_reducers<S: Clone + Send + Sync + 'static>(slices: Vec<SliceReducer<S>>) -> Reducer<S> {
    Arc::new(move |state: &Arc<S>, action: &StoreAction| {
        let mut next = (**state).clone();
        let mut changed = false;
        for slice in &slices {
            changed |= (slice.reduce)(&mut next, action);
        }
        if changed {
            Arc::new(next)
        } else {
            Arc::clone(state)
        }
    })
}

struct Inner<S> {
    state: Arc<S>,
    middleware: Vec<Middleware<S>>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

pub struct Store<S> {
    reducer: Reducer<S>,
    dispatch_hook: Option<DispatchHook<S>>,
    panic_hook: Option<Arc<dyn Fn(&StoreAction) + Send + Sync>>,
    inner: Mutex<Inner<S>>,
}

impl<S: Send + Sync + 'static> Store<S> {
    pub fn new(reducer: Reducer<S>, preloaded: S) -> Self {
        Self {
            reducer,
            dispatch_hook: None,
            panic_hook: None,
            inner: Mutex::new(Inner {
                state: Arc::new(preloaded),
                middleware: Vec::new(),
                listeners: Vec::new(),
                next_listener_id: 1,
            }),
        }
    }

    /// Called after every dispatch (even when cancelled by middleware, in
    /// which case `prior` and `current` are the same `Arc`) with the action,
    /// the prior state, and the resulting state. Used by `NavigatorCore` to
    /// mirror dispatches onto the `EventBus` as `action:dispatched`.
    pub fn set_dispatch_hook(&mut self, hook: DispatchHook<S>) {
        self.dispatch_hook = Some(hook);
    }

    /// Called when the reducer panics, with the action that caused it.
    /// Wired by `NavigatorCore` to re-publish as `system:error`.
    pub fn set_panic_hook(&mut self, hook: Arc<dyn Fn(&StoreAction) + Send + Sync>) {
        self.panic_hook = Some(hook);
    }

    pub fn use_middleware(&self, middleware: Middleware<S>) {
        self.inner.lock().unwrap().middleware.push(middleware);
    }

    pub fn get_state(&self) -> Arc<S> {
        self.inner.lock().unwrap().state.clone()
    }

    /// Returns an id usable with `unsubscribe`.
    pub fn subscribe<F>(&self, listener: F) -> u64
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.inner.lock().unwrap().listeners.retain(|(i, _)| *i != id);
    }

    /// Runs the middleware chain (any `None` cancels — reducer does not
    /// run, no `action:dispatched`, but the hook still fires so observers
    /// can tell the dispatch was refused), applies the reducer, and notifies
    /// subscribers strictly after the reducer completes.
    pub fn dispatch(&self, action: StoreAction) -> Result<StoreAction, NavigatorError> {
        if action.type_.is_empty() {
            return Err(NavigatorError::DispatchMissingType);
        }

        let middleware = self.inner.lock().unwrap().middleware.clone();
        let mut current = action;
        let prior = self.get_state();
        for mw in &middleware {
            match mw(&prior, &current) {
                Some(transformed) => current = transformed,
                None => {
                    if let Some(hook) = &self.dispatch_hook {
                        hook(&current, &prior, &prior);
                    }
                    return Ok(current);
                }
            }
        }

        let reduced = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (self.reducer)(&prior, &current)));
        let next_state = match reduced {
            Ok(s) => s,
            Err(_) => {
                tracing::error!(action = %current.type_, "reducer panicked; state left unchanged");
                if let Some(hook) = &self.panic_hook {
                    hook(&current);
                }
                prior.clone()
            }
        };

        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = next_state.clone();
        }

        if !Arc::ptr_eq(&prior, &next_state) {
            let listeners = self.inner.lock().unwrap().listeners.clone();
            for (_, listener) in listeners {
                listener();
            }
        }

        if let Some(hook) = &self.dispatch_hook {
            hook(&current, &prior, &next_state);
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests;
