//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events
//! after sync passes. Embedding applications implement the sink to react
//! to rate changes.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
