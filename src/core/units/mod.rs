//! Execution units of the control cores.

/// Integer arithmetic.
pub mod alu;

/// Single-precision and packed FP8 arithmetic.
pub mod fpu;
