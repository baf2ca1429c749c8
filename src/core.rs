//! NavigatorCore: plugin registry, lifecycle state machine, and the shared
//! handles (`event_bus`, `store`, `app_state`, action history) every plugin
//! is built against.
//!
//! Lifecycle methods take `self: Arc<Self>` rather than `&self` because
//! deferred-tier plugin init must be able to spawn a background task that
//! outlives the `init()` call — the same "own an `Arc` clone, don't borrow"
//! shape the teacher crate uses wherever a task needs to survive past the
//! function that launched it.

use crate::app_state::AppState;
use crate::clock::Clock;
use crate::error::NavigatorError;
use crate::event_bus::EventBus;
use crate::plugin::{Plugin, PluginState, DEFAULT_CRITICAL_PRIORITY_THRESHOLD};
use crate::session_history::{Action, ErrorClusters, Metrics, UserSessionHistory};
use crate::store::{reducers::RootState, Store};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct NavigatorCoreOptions {
    pub debug_mode: bool,
    pub auto_start: bool,
    /// Default snapshot for the legacy `AppState`.
    pub initial_state: Option<Value>,
    pub history_max_size: usize,
    pub critical_priority_threshold: i32,
}

impl Default for NavigatorCoreOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            auto_start: false,
            initial_state: None,
            history_max_size: 500,
            critical_priority_threshold: DEFAULT_CRITICAL_PRIORITY_THRESHOLD,
        }
    }
}

#[derive(Default)]
pub struct RegisterPluginOptions {
    pub priority: Option<i32>,
    pub config: Option<Value>,
}

struct RegisteredPlugin {
    plugin: Arc<dyn Plugin>,
    priority: i32,
    config: Option<Value>,
    state: PluginState,
}

pub struct NavigatorCore {
    pub event_bus: Arc<EventBus>,
    pub store: Arc<Store<RootState>>,
    pub app_state: Arc<AppState>,
    history: Arc<Mutex<UserSessionHistory>>,
    clock: Clock,
    plugins: Mutex<Vec<RegisteredPlugin>>,
    is_initialized: AtomicBool,
    is_running: AtomicBool,
    auto_start: bool,
    critical_priority_threshold: i32,
    debug_mode: bool,
}

impl NavigatorCore {
    pub fn new(options: NavigatorCoreOptions) -> Arc<Self> {
        let clock = Clock::new();
        let event_bus = Arc::new(EventBus::new(clock.clone()));
        let app_state = Arc::new(AppState::new(
            event_bus.clone(),
            options.initial_state.unwrap_or_else(|| serde_json::json!({})),
        ));

        let mut store = Store::new(crate::store::reducers::root_reducer(), RootState::default());

        let bus_for_hook = event_bus.clone();
        let app_state_for_hook = app_state.clone();
        store.set_dispatch_hook(Arc::new(move |action, prior, next| {
            bus_for_hook.emit(
                "action:dispatched",
                serde_json::json!({
                    "action": action,
                    "previous": &**prior,
                    "current": &**next,
                }),
            );
            // Bridge: mirror the new root state into the legacy AppState so
            // its path-based watchers observe Store-driven changes too.
            if !Arc::ptr_eq(prior, next) {
                if let Ok(value) = serde_json::to_value(&**next) {
                    app_state_for_hook.set_partial(
                        value,
                        crate::app_state::SetStateOptions {
                            silent: false,
                            merge: true,
                            source: Some("store"),
                        },
                    );
                }
            }
        }));

        let panic_bus = event_bus.clone();
        store.set_panic_hook(Arc::new(move |action| {
            panic_bus.emit(
                "system:error",
                serde_json::json!({
                    "message": format!("reducer for '{}' panicked", action.type_),
                    "action": action,
                }),
            );
        }));

        Arc::new(Self {
            event_bus,
            store: Arc::new(store),
            app_state,
            history: Arc::new(Mutex::new(UserSessionHistory::new(options.history_max_size))),
            clock,
            plugins: Mutex::new(Vec::new()),
            is_initialized: AtomicBool::new(false),
            is_running: AtomicBool::new(false),
            auto_start: options.auto_start,
            critical_priority_threshold: options.critical_priority_threshold,
            debug_mode: options.debug_mode,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Validates `plugin.name()` uniqueness and inserts into priority order
    /// (highest first; ties keep registration order, since `sort_by` is
    /// stable). `MissingInit` from the original taxonomy has no Rust
    /// counterpart here: the `Plugin` trait requires `init`, so that
    /// contract violation is caught by the type system instead of at
    /// registration time.
    pub fn register_plugin(&self, plugin: Arc<dyn Plugin>, opts: RegisterPluginOptions) -> Result<(), NavigatorError> {
        let mut registry = self.plugins.lock().unwrap();
        let name = plugin.name().to_string();
        if registry.iter().any(|rp| rp.plugin.name() == name) {
            return Err(NavigatorError::DuplicatePlugin(name));
        }
        let priority = opts.priority.unwrap_or_else(|| plugin.priority());
        registry.push(RegisteredPlugin {
            plugin,
            priority,
            config: opts.config,
            state: PluginState::Registered,
        });
        registry.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(())
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.lock().unwrap().iter().find(|rp| rp.plugin.name() == name).map(|rp| rp.plugin.clone())
    }

    pub fn plugin_config(&self, name: &str) -> Option<Value> {
        self.plugins
            .lock()
            .unwrap()
            .iter()
            .find(|rp| rp.plugin.name() == name)
            .and_then(|rp| rp.config.clone())
    }

    pub fn plugin_state(&self, name: &str) -> Option<PluginState> {
        self.plugins.lock().unwrap().iter().find(|rp| rp.plugin.name() == name).map(|rp| rp.state)
    }

    fn set_plugin_state(&self, name: &str, state: PluginState) {
        let mut registry = self.plugins.lock().unwrap();
        if let Some(rp) = registry.iter_mut().find(|rp| rp.plugin.name() == name) {
            rp.state = state;
        }
    }

    pub fn record_action(&self, action: Action) {
        let history_size = {
            let mut history = self.history.lock().unwrap();
            history.add(action.clone());
            history.size()
        };
        self.event_bus.emit(
            "history:action:recorded",
            serde_json::json!({ "action": action, "historySize": history_size }),
        );
    }

    pub fn history_size(&self) -> usize {
        self.history.lock().unwrap().size()
    }

    pub fn history_latest(&self, n: usize) -> Vec<Action> {
        self.history.lock().unwrap().get_latest(n)
    }

    pub fn history_metrics(&self, window_size: usize) -> Metrics {
        self.history.lock().unwrap().get_metrics(window_size)
    }

    pub fn history_error_clusters(&self, time_window_ms: u64) -> ErrorClusters {
        self.history.lock().unwrap().get_error_clusters(time_window_ms)
    }

    /// A shared handle onto the session history, for analyzer plugins
    /// (`CognitiveModel`, `IntentPredictor`) that poll it from a background
    /// task spawned in `init` and therefore can no longer borrow `&self`.
    pub fn history_handle(&self) -> Arc<Mutex<UserSessionHistory>> {
        self.history.clone()
    }

    async fn run_init(core: Arc<NavigatorCore>, plugin: Arc<dyn Plugin>) -> (Arc<dyn Plugin>, Result<(), NavigatorError>) {
        let timeout = plugin.init_timeout();
        let name = plugin.name().to_string();
        let core_ref: &NavigatorCore = &core;
        let outcome = tokio::time::timeout(timeout, plugin.init(core_ref)).await;
        match outcome {
            Ok(result) => (plugin, result),
            Err(_) => (
                plugin,
                Err(NavigatorError::InitTimeout { plugin: name, timeout_ms: timeout.as_millis() as u64 }),
            ),
        }
    }

    /// Critical-tier (`priority >= critical_priority_threshold`) plugins
    /// init concurrently and are awaited as a set before `core:init:complete`;
    /// a critical failure aborts `init` and the core stays `constructed`.
    /// Deferred-tier plugins init in the background afterward; `auto_start`
    /// (if set) runs `start()` once the critical tier is up, without
    /// waiting on the deferred tier.
    pub async fn init(self: Arc<Self>) -> Result<(), NavigatorError> {
        if self.is_initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.event_bus.emit("core:init:start", serde_json::json!({}));

        let (critical, deferred): (Vec<Arc<dyn Plugin>>, Vec<Arc<dyn Plugin>>) = {
            let registry = self.plugins.lock().unwrap();
            let threshold = self.critical_priority_threshold;
            let mut critical = Vec::new();
            let mut deferred = Vec::new();
            for rp in registry.iter() {
                if rp.priority >= threshold {
                    critical.push(rp.plugin.clone());
                } else {
                    deferred.push(rp.plugin.clone());
                }
            }
            (critical, deferred)
        };

        let results = futures::future::join_all(critical.into_iter().map(|p| Self::run_init(self.clone(), p))).await;

        let mut first_failure: Option<NavigatorError> = None;
        for (plugin, result) in &results {
            match result {
                Ok(()) => {
                    self.set_plugin_state(plugin.name(), PluginState::Initialized);
                    self.event_bus.emit("core:plugin:initialized", serde_json::json!({ "name": plugin.name() }));
                }
                Err(e) => {
                    self.event_bus.emit(
                        "core:plugin:error",
                        serde_json::json!({ "name": plugin.name(), "error": e.to_string() }),
                    );
                    if first_failure.is_none() {
                        first_failure = Some(e.clone());
                    }
                }
            }
        }

        if let Some(e) = first_failure {
            self.event_bus.emit("core:error", serde_json::json!({ "phase": "init", "error": e.to_string() }));
            return Err(e);
        }

        self.event_bus.emit("core:init:complete", serde_json::json!({}));
        self.is_initialized.store(true, Ordering::SeqCst);

        let core_for_deferred = self.clone();
        tokio::spawn(async move {
            let results =
                futures::future::join_all(deferred.into_iter().map(|p| NavigatorCore::run_init(core_for_deferred.clone(), p))).await;
            for (plugin, result) in &results {
                match result {
                    Ok(()) => {
                        core_for_deferred.set_plugin_state(plugin.name(), PluginState::Initialized);
                        core_for_deferred
                            .event_bus
                            .emit("core:plugin:initialized", serde_json::json!({ "name": plugin.name() }));
                    }
                    Err(e) => {
                        core_for_deferred.event_bus.emit(
                            "core:plugin:error",
                            serde_json::json!({ "name": plugin.name(), "error": e.to_string() }),
                        );
                    }
                }
            }
            core_for_deferred.event_bus.emit("core:deferred:ready", serde_json::json!({}));
        });

        if self.auto_start {
            self.clone().start().await?;
        }

        Ok(())
    }

    /// Sequential, strictly descending-priority order. On failure, aborts
    /// and best-effort stops whatever had already started, in reverse.
    pub async fn start(self: Arc<Self>) -> Result<(), NavigatorError> {
        if self.is_running.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.event_bus.emit("core:start:begin", serde_json::json!({}));

        let ordered: Vec<Arc<dyn Plugin>> = {
            let registry = self.plugins.lock().unwrap();
            registry.iter().map(|rp| rp.plugin.clone()).collect()
        };

        let mut started: Vec<Arc<dyn Plugin>> = Vec::new();
        for plugin in &ordered {
            match plugin.start().await {
                Ok(()) => {
                    self.set_plugin_state(plugin.name(), PluginState::Started);
                    self.event_bus.emit("core:plugin:started", serde_json::json!({ "name": plugin.name() }));
                    started.push(plugin.clone());
                }
                Err(e) => {
                    self.event_bus.emit(
                        "core:plugin:error",
                        serde_json::json!({ "name": plugin.name(), "error": e.to_string() }),
                    );
                    self.event_bus.emit("core:error", serde_json::json!({ "phase": "start", "error": e.to_string() }));
                    for p in started.iter().rev() {
                        match p.stop().await {
                            Ok(()) => self.set_plugin_state(p.name(), PluginState::Stopped),
                            Err(stop_err) => {
                                tracing::warn!(plugin = p.name(), error = %stop_err, "best-effort stop after failed start also failed");
                            }
                        }
                    }
                    return Err(NavigatorError::PluginStartFailed { plugin: plugin.name().to_string(), reason: e.to_string() });
                }
            }
        }

        self.event_bus.emit("core:start:complete", serde_json::json!({}));
        self.is_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Reverse of start order. Best-effort: a plugin's failure to stop is
    /// logged and emitted but does not block the rest.
    pub async fn stop(self: Arc<Self>) -> Result<(), NavigatorError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.event_bus.emit("core:stop:begin", serde_json::json!({}));

        let ordered: Vec<Arc<dyn Plugin>> = {
            let registry = self.plugins.lock().unwrap();
            registry.iter().rev().map(|rp| rp.plugin.clone()).collect()
        };

        for plugin in &ordered {
            if let Err(e) = plugin.stop().await {
                tracing::warn!(plugin = plugin.name(), error = %e, "plugin stop failed; continuing best-effort");
                self.event_bus.emit(
                    "core:plugin:error",
                    serde_json::json!({ "name": plugin.name(), "error": e.to_string() }),
                );
            }
            self.set_plugin_state(plugin.name(), PluginState::Stopped);
            self.event_bus.emit("core:plugin:stopped", serde_json::json!({ "name": plugin.name() }));
        }

        self.event_bus.emit("core:stop:complete", serde_json::json!({}));
        self.is_running.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Never aborts; cleanup is best-effort regardless of current lifecycle
    /// state.
    pub async fn destroy(self: Arc<Self>) -> Result<(), NavigatorError> {
        self.event_bus.emit("core:destroy:begin", serde_json::json!({}));

        let ordered: Vec<Arc<dyn Plugin>> = {
            let registry = self.plugins.lock().unwrap();
            registry.iter().rev().map(|rp| rp.plugin.clone()).collect()
        };

        for plugin in &ordered {
            if let Err(e) = plugin.destroy().await {
                tracing::warn!(plugin = plugin.name(), error = %e, "plugin destroy failed; continuing best-effort");
            }
            self.set_plugin_state(plugin.name(), PluginState::Destroyed);
            self.event_bus.emit("core:plugin:destroyed", serde_json::json!({ "name": plugin.name() }));
        }

        self.event_bus.emit("core:destroy:complete", serde_json::json!({}));
        self.is_initialized.store(false, Ordering::SeqCst);
        self.is_running.store(false, Ordering::SeqCst);
        Ok(())
    }
}
