//! Demo/test input-plugin fixtures. Neither is a production input driver —
//! real gesture/voice capture is explicitly out of scope (see SPEC_FULL.md
//! §1) — but the seed scenarios in spec.md §8 need a keyboard source and a
//! source-agnostic mock to exercise the `Plugin` contract end to end.

pub mod keyboard;
pub mod mock;

pub use keyboard::KeyboardPlugin;
pub use mock::MockPlugin;
