//! Monotonic clock shared by every subsystem.
//!
//! The spec leaves the timestamp origin unspecified but requires it be
//! consistent within a session. We fix the origin the moment a `Clock` is
//! created (normally once, inside `NavigatorCore::new`) and hand out
//! milliseconds elapsed since then. `Instant` is not `Send`-safe to share by
//! value across a clone boundary in the way we need here, so the origin is
//! wrapped in an `Arc` and every subsystem holds a cheap clone of the clock.

use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct Clock {
    origin: Arc<Instant>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Arc::new(Instant::now()),
        }
    }

    /// Milliseconds elapsed since this clock's origin.
    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
