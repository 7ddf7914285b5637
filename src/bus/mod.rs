//! Game event broadcast.
//!
//! The engine publishes a `GameEvent` after every state change it makes so a
//! presentation layer can re-render from a fresh snapshot. Events are fire and
//! forget: with nobody listening, publishing is a no-op.

mod event_bus;
pub mod event_types;

pub use event_bus::{EventBus, GameEvent};
