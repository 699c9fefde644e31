//! Architectural state of a control core.
//!
//! Two parallel register files indexed by register number. Only the
//! writeback stage mutates them.

/// Floating-Point Register file implementation.
pub mod fpr;

/// Integer Register file implementation.
pub mod gpr;

use fpr::Fpr;
use gpr::Gpr;

/// Integer and float register files of one core.
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    /// Integer registers.
    pub int: Gpr,
    /// Float registers.
    pub fp: Fpr,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            int: Gpr::new(),
            fp: Fpr::new(),
        }
    }
}
