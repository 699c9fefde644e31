//! Controller cores.
//!
//! Both controller personalities share one five-stage in-order engine over
//! private instruction and data memories. The control core drives the CAM,
//! MPE and MMR of one cell; the tile controller fans vectors out to its
//! cores and reduces their results.

/// Architectural register files.
pub mod arch;

/// The per-cell control core.
pub mod control_core;

/// The tile controller.
pub mod control_tile;

/// Instruction format and decode table.
pub mod isa;

/// Byte-addressable data memory.
pub mod memory;

/// Pipeline state, personality trait and engine.
pub mod pipeline;

/// Stage functions.
pub mod stages;

/// Execution units.
pub mod units;

pub use control_core::ControlCore;
pub use control_tile::ControlTile;
