//! Common utilities and types used throughout the accelerator simulator.
//!
//! This module provides the scheduling primitive, the event shapes carried
//! between components, the little-endian byte codecs and the fatal error
//! type that are shared by every hardware model.

/// Little-endian byte codecs for words and IEEE-754 singles.
pub mod data;

/// Fatal simulation error type.
pub mod error;

/// Events exchanged between components.
pub mod event;

/// Delay queues and the busy/completion discipline built on them.
pub mod queue;

/// A simulated clock cycle.
pub type Cycle = u64;

pub use error::SimError;
pub use event::Event;
pub use queue::{BusyUnit, DelayQueue};
