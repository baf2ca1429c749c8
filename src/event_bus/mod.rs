//! Pub/sub event bus with middleware, wildcard/priority delivery, history,
//! stats, and a re-entrancy circuit breaker.
//!
//! Delivery is synchronous and in-emit-order: `emit` does not return until
//! every middleware and every handler for that emission has run. Handlers
//! are snapshotted before dispatch so subscriptions added *during* an emit
//! never observe that same emit. Handler/middleware closures are stored
//! behind `Arc` rather than called while the internal lock is held, so a
//! handler is free to call `emit` again re-entrantly without deadlocking —
//! the circuit breaker, not the mutex, is what bounds that recursion.

use crate::clock::Clock;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type Handler = Arc<dyn Fn(&NavigatorEvent) + Send + Sync>;
pub type Middleware = Arc<dyn Fn(NavigatorEvent) -> Option<NavigatorEvent> + Send + Sync>;

const DEFAULT_HISTORY_LIMIT: usize = 100;
const DEFAULT_MAX_CALL_DEPTH: u32 = 100;
const DEFAULT_MAX_CHAIN_LENGTH: usize = 50;

/// Envelope delivered to handlers. Immutable once middleware has run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NavigatorEvent {
    pub name: String,
    pub payload: Value,
    pub timestamp_ms: u64,
    pub source: String,
}

/// Opaque handle returned by `on`/`once`, used to `off` a single handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeOptions {
    pub once: bool,
    pub priority: i32,
}

struct Subscription {
    id: u64,
    seq: u64,
    priority: i32,
    once: bool,
    handler: Handler,
}

#[derive(Debug, Clone, Default)]
pub struct BusStats {
    pub total_events: u64,
    pub counts: HashMap<String, u64>,
}

impl BusStats {
    /// Top `k` event names by emitted count, descending.
    pub fn top(&self, k: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(n, c)| (n.clone(), *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(k);
        entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerKind {
    MaxDepth,
    Cycle,
}

impl BreakerKind {
    fn as_str(self) -> &'static str {
        match self {
            BreakerKind::MaxDepth => "max_depth_exceeded",
            BreakerKind::Cycle => "cycle_detected",
        }
    }
}

struct Inner {
    handlers: HashMap<String, Vec<Subscription>>,
    middleware: Vec<Middleware>,
    history: VecDeque<NavigatorEvent>,
    history_limit: usize,
    stats: BusStats,
    call_depth: HashMap<String, u32>,
    event_chain: Vec<String>,
    max_call_depth: u32,
    max_chain_length: usize,
}

impl Inner {
    fn fresh(history_limit: usize) -> Self {
        Self {
            handlers: HashMap::new(),
            middleware: Vec::new(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
            stats: BusStats::default(),
            call_depth: HashMap::new(),
            event_chain: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
        }
    }
}

pub struct EventBus {
    inner: Mutex<Inner>,
    clock: Clock,
    next_id: AtomicU64,
    next_seq: AtomicU64,
}

impl EventBus {
    pub fn new(clock: Clock) -> Self {
        Self::with_history_limit(clock, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(clock: Clock, history_limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::fresh(history_limit)),
            clock,
            next_id: AtomicU64::new(1),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Subscribe to `name`; `"*"` subscribes to every event. Returns a
    /// handle for `off`/`unsubscribe`. Handlers added while an emit is
    /// iterating its snapshot never observe that emit.
    pub fn on<F>(&self, name: &str, handler: F, opts: SubscribeOptions) -> SubscriptionId
    where
        F: Fn(&NavigatorEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let sub = Subscription {
            id,
            seq,
            priority: opts.priority,
            once: opts.once,
            handler: Arc::new(handler),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.handlers.entry(name.to_string()).or_default().push(sub);
        SubscriptionId(id)
    }

    /// Sugar for `on(name, handler, { once: true, .. })`.
    pub fn once<F>(&self, name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&NavigatorEvent) + Send + Sync + 'static,
    {
        self.on(
            name,
            handler,
            SubscribeOptions {
                once: true,
                priority: 0,
            },
        )
    }

    /// Remove a single handler (`Some(id)`) or every handler for `name`
    /// (`None`).
    pub fn off(&self, name: &str, id: Option<SubscriptionId>) {
        let mut inner = self.inner.lock().unwrap();
        match id {
            Some(SubscriptionId(id)) => {
                if let Some(subs) = inner.handlers.get_mut(name) {
                    subs.retain(|s| s.id != id);
                }
            }
            None => {
                inner.handlers.remove(name);
            }
        }
    }

    /// Remove a handler regardless of which name it is registered under.
    /// Equivalent to the "unsubscribe function" the spec returns from `on`.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock().unwrap();
        for subs in inner.handlers.values_mut() {
            subs.retain(|s| s.id != id.0);
        }
    }

    /// Push a middleware onto the chain. Runs in registration order before
    /// handler dispatch; returning `None` cancels the emission.
    pub fn use_middleware<F>(&self, middleware: F)
    where
        F: Fn(NavigatorEvent) -> Option<NavigatorEvent> + Send + Sync + 'static,
    {
        self.inner.lock().unwrap().middleware.push(Arc::new(middleware));
    }

    /// Emit `name` with `payload`. Returns `true` if any handler ran.
    pub fn emit(&self, name: &str, payload: Value) -> bool {
        self.emit_internal(name, payload)
    }

    fn emit_internal(&self, name: &str, payload: Value) -> bool {
        let bypass_breaker = name == "system:circuit-breaker";

        if !bypass_breaker {
            let refusal = {
                let mut inner = self.inner.lock().unwrap();
                let depth = *inner.call_depth.get(name).unwrap_or(&0);
                if depth >= inner.max_call_depth {
                    Some(BreakerKind::MaxDepth)
                } else if inner.event_chain.iter().any(|n| n == name)
                    && inner.event_chain.len() >= inner.max_chain_length
                {
                    Some(BreakerKind::Cycle)
                } else {
                    inner.event_chain.push(name.to_string());
                    *inner.call_depth.entry(name.to_string()).or_insert(0) += 1;
                    None
                }
            };

            if let Some(kind) = refusal {
                tracing::warn!(event = name, kind = kind.as_str(), "circuit breaker tripped");
                self.emit_circuit_breaker(name, kind);
                return false;
            }
        }

        let result = self.dispatch(name, payload);

        if !bypass_breaker {
            let mut inner = self.inner.lock().unwrap();
            inner.event_chain.pop();
            if let Some(c) = inner.call_depth.get_mut(name) {
                *c = c.saturating_sub(1);
            }
        }

        result
    }

    /// Emit `system:circuit-breaker` without going through the breaker
    /// bookkeeping itself (rule: it never trips the breaker).
    fn emit_circuit_breaker(&self, refused_name: &str, kind: BreakerKind) {
        let chain = {
            let inner = self.inner.lock().unwrap();
            inner.event_chain.clone()
        };
        let payload = serde_json::json!({
            "type": kind.as_str(),
            "event": refused_name,
            "chain": chain,
        });
        self.emit_internal("system:circuit-breaker", payload);
    }

    fn dispatch(&self, name: &str, payload: Value) -> bool {
        let source = payload
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let event = NavigatorEvent {
            name: name.to_string(),
            payload,
            timestamp_ms: self.clock.now_ms(),
            source,
        };

        // Middleware runs on a snapshot of the chain so it can re-enter the
        // bus (e.g. emit a diagnostic) without holding the lock.
        let middleware_snapshot: Vec<Middleware> = self.inner.lock().unwrap().middleware.clone();
        let mut current = event;
        for mw in &middleware_snapshot {
            match mw(current) {
                Some(next) => current = next,
                None => return false,
            }
        }
        let event = current;

        let (specific, wildcard) = {
            let mut inner = self.inner.lock().unwrap();
            inner.history.push_back(event.clone());
            while inner.history.len() > inner.history_limit {
                inner.history.pop_front();
            }
            inner.stats.total_events += 1;
            *inner.stats.counts.entry(name.to_string()).or_insert(0) += 1;

            let specific = Self::snapshot(inner.handlers.get(name));
            let wildcard = if name != "*" {
                Self::snapshot(inner.handlers.get("*"))
            } else {
                Vec::new()
            };
            (specific, wildcard)
        };

        let mut invoked = false;
        for id in specific {
            invoked |= self.invoke_one(name, id, &event);
        }
        for id in wildcard {
            invoked |= self.invoke_one("*", id, &event);
        }
        invoked
    }

    /// Snapshot handler ids in priority order (desc), ties by insertion
    /// order (asc). We snapshot ids, not closures, so `off` during
    /// iteration is observed immediately for handlers not yet invoked.
    fn snapshot(subs: Option<&Vec<Subscription>>) -> Vec<u64> {
        let Some(subs) = subs else {
            return Vec::new();
        };
        let mut ordered: Vec<&Subscription> = subs.iter().collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.seq.cmp(&b.seq)));
        ordered.into_iter().map(|s| s.id).collect()
    }

    /// Invoke the handler `id` registered under `bucket` (either the event's
    /// own name or `"*"` for wildcard subscriptions). `event.name` carries
    /// the real event name for logging and the panic-reemission guard. The
    /// handler `Arc` is cloned out and invoked with the lock released.
    fn invoke_one(&self, bucket: &str, id: u64, event: &NavigatorEvent) -> bool {
        let found = {
            let inner = self.inner.lock().unwrap();
            inner
                .handlers
                .get(bucket)
                .and_then(|subs| subs.iter().find(|s| s.id == id))
                .map(|s| (s.handler.clone(), s.once))
        };
        let Some((handler, once)) = found else {
            return false;
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event)));

        if once {
            self.unsubscribe(SubscriptionId(id));
        }

        match result {
            Ok(()) => true,
            Err(_) => {
                tracing::error!(event = %event.name, "event handler panicked");
                if event.name != "system:error" && event.name != "system:circuit-breaker" {
                    let payload = serde_json::json!({
                        "message": format!("handler for '{}' panicked", event.name),
                        "event": event.name,
                    });
                    self.emit_internal("system:error", payload);
                }
                true
            }
        }
    }

    /// Wait for the next occurrence of `name`. `None` timeout waits
    /// forever; `Some(Duration::ZERO)` rejects on the next microtask.
    pub async fn wait_for(
        &self,
        name: &str,
        timeout: Option<std::time::Duration>,
    ) -> Result<NavigatorEvent, crate::error::NavigatorError> {
        let (tx, rx) = tokio::sync::oneshot::channel::<NavigatorEvent>();
        let tx = Mutex::new(Some(tx));
        let id = self.once(name, move |evt| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(evt.clone());
            }
        });

        match timeout {
            Some(d) => match tokio::time::timeout(d, rx).await {
                Ok(Ok(evt)) => Ok(evt),
                Ok(Err(_)) => Err(crate::error::NavigatorError::WaitForTimeout(name.to_string())),
                Err(_) => {
                    self.unsubscribe(id);
                    Err(crate::error::NavigatorError::WaitForTimeout(name.to_string()))
                }
            },
            None => rx
                .await
                .map_err(|_| crate::error::NavigatorError::WaitForTimeout(name.to_string())),
        }
    }

    pub fn get_history(&self, name: Option<&str>, limit: usize) -> Vec<NavigatorEvent> {
        let inner = self.inner.lock().unwrap();
        let filtered: Vec<&NavigatorEvent> = inner
            .history
            .iter()
            .filter(|e| name.map(|n| e.name == n).unwrap_or(true))
            .collect();
        let start = filtered.len().saturating_sub(limit);
        filtered[start..].iter().map(|e| (*e).clone()).collect()
    }

    pub fn get_stats(&self) -> BusStats {
        self.inner.lock().unwrap().stats.clone()
    }

    /// Remove all handlers and reset history/stats. Middleware and breaker
    /// configuration survive (see `reset` for a full reinitialize).
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.handlers.clear();
        inner.history.clear();
        inner.stats = BusStats::default();
    }

    /// `clear()` plus middleware and breaker state, i.e. back to
    /// construction-time defaults.
    pub fn reset(&self) {
        let history_limit = self.inner.lock().unwrap().history_limit;
        *self.inner.lock().unwrap() = Inner::fresh(history_limit);
    }

    pub fn set_breaker_limits(&self, max_call_depth: u32, max_chain_length: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.max_call_depth = max_call_depth;
        inner.max_chain_length = max_chain_length;
    }
}

#[cfg(test)]
mod tests;
