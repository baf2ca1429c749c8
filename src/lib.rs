//! Navigator: an in-process, multi-modal navigation runtime.
//!
//! Physical inputs are captured by plugins, translated into intents, routed
//! through a central [`event_bus`], and reduced into a single [`store`] tree.
//! A [`cognitive`] layer infers user state from the action stream; an
//! [`intent`] layer predicts navigation intent from hand trajectories. The
//! crate is transport- and UI-agnostic: it exposes a plain Rust API for an
//! embedding host (the `navigator-demo` terminal binary, in this repo) to
//! drive.

pub mod app_state;
pub mod clock;
pub mod cognitive;
pub mod config;
pub mod core;
pub mod error;
pub mod event_bus;
pub mod intent;
pub mod logging;
pub mod persistence;
pub mod plugin;
pub mod plugins;
pub mod session_history;
pub mod store;

pub use clock::Clock;
pub use core::{NavigatorCore, NavigatorCoreOptions, RegisterPluginOptions};
pub use error::NavigatorError;
pub use plugin::{Plugin, PluginState};
