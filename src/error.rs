//! Crate-wide error taxonomy
//!
//! Contract violations (duplicate plugin names, missing `init`, malformed
//! dispatch) surface as `Err` at the offending call. Plugin/handler/reducer
//! failures are caught internally, logged, and re-published on the
//! `EventBus` as `system:error` / `core:plugin:error`; they only reach this
//! type when the caller needs to know a lifecycle call was aborted.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NavigatorError {
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(String),

    #[error("plugin '{0}' has no init hook")]
    MissingInit(String),

    #[error("no plugin named '{0}' is registered")]
    UnknownPlugin(String),

    #[error("plugin '{plugin}' init failed: {reason}")]
    PluginInitFailed { plugin: String, reason: String },

    #[error("plugin '{plugin}' init timed out after {timeout_ms}ms")]
    InitTimeout { plugin: String, timeout_ms: u64 },

    #[error("plugin '{plugin}' start failed: {reason}")]
    PluginStartFailed { plugin: String, reason: String },

    #[error("handler for event '{0}' panicked")]
    HandlerPanicked(String),

    #[error("dispatch requires a non-empty action type")]
    DispatchMissingType,

    #[error("reducer for action '{0}' panicked; state left unchanged")]
    ReducerPanicked(String),

    #[error("emit('{name}') refused: {kind}")]
    CircuitBreakerTripped { name: String, kind: String },

    #[error("waitFor('{0}') timed out")]
    WaitForTimeout(String),

    #[error("core is not in a state that permits this call: {0}")]
    InvalidLifecycleState(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    Config(String),
}
