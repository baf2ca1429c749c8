//! The Plugin SPI: the stable surface `NavigatorCore` consumes from plugins.
//!
//! Async lifecycle methods via `#[async_trait]`, grounded on the
//! `other_examples` `gauss-core::plugin::Plugin` trait — an async lifecycle
//! trait with default no-op hooks beyond the required one.

use crate::core::NavigatorCore;
use crate::error::NavigatorError;
use async_trait::async_trait;
use std::time::Duration;

/// Priority at or above which a plugin is treated as critical: its `init`
/// runs concurrently with other critical plugins and blocks `core:init:complete`.
pub const DEFAULT_CRITICAL_PRIORITY_THRESHOLD: i32 = 100;

#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique among all plugins registered on a given core.
    fn name(&self) -> &str;

    /// Higher runs first in `start`; `start`/`stop`/`destroy` order is
    /// derived from this, not reassigned per call.
    fn priority(&self) -> i32 {
        0
    }

    fn init_timeout(&self) -> Duration {
        Duration::from_millis(5000)
    }

    /// The only required lifecycle hook.
    async fn init(&self, core: &NavigatorCore) -> Result<(), NavigatorError>;

    async fn start(&self) -> Result<(), NavigatorError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), NavigatorError> {
        Ok(())
    }

    async fn destroy(&self) -> Result<(), NavigatorError> {
        Ok(())
    }
}

/// Per-plugin lifecycle state, tracked by `NavigatorCore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Registered,
    Initialized,
    Started,
    Stopped,
    Destroyed,
}
