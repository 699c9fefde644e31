//! Test module organization.
//!
//! This module organizes all integration tests for the CAM accelerator simulator.

/// ALU (Arithmetic Logic Unit) operation tests.
mod alu_tests;






/// Floating-Point Unit and fp8 SIMD tests.
mod fpu_tests;


/// Instruction table parsing and decode tests.
mod isa_tests;

/// Match processing element and match register tests.
mod mpe_mmr_tests;

/// Five-stage pipeline timing and semantics tests.
mod pipeline_tests;

/// Reduction and broadcast router tests.
mod router_tests;
