//! Pipeline stage implementations.
//!
//! Each stage is a free function over the engine that consumes its input
//! latch, fills its output latch and returns whether it produced an output.

/// Instruction fetch.
pub mod fetch;

/// Instruction decode and register read.
pub mod decode;

/// Integer, float and branch execution.
pub mod execute;

/// Data memory access and vector copies.
pub mod memory_access;

/// Register writeback.
pub mod write_back;
