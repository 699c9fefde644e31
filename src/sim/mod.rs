//! Simulation harness support.

/// Workload files.
pub mod loader;

/// Log sink setup and trace categories.
pub mod logging;
