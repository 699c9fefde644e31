//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used in the Execute stage. All
//! arithmetic is on unsigned 32-bit operands and wraps on overflow.

/// Integer operations available to the execute stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Shift left by the low five bits of the second operand.
    Shl,
    /// Wrapping multiplication.
    Mul,
}

/// Arithmetic Logic Unit (ALU) for integer operations.
pub struct Alu;

impl Alu {
    /// Executes an integer ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The ALU operation to perform
    /// * `a` - First operand
    /// * `b` - Second operand (shift amount for `Shl`)
    ///
    /// # Returns
    ///
    /// The 32-bit result, wrapped on overflow.
    pub fn execute(op: AluOp, a: u32, b: u32) -> u32 {
        /// Bit mask for the shift amount (5 bits: 0-31).
        const SHAMT_MASK: u32 = 0x1f;

        match op {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Shl => a << (b & SHAMT_MASK),
            AluOp::Mul => a.wrapping_mul(b),
        }
    }

    /// Decodes a sign-magnitude branch offset.
    ///
    /// Bit 11 of the immediate is the sign and the low eight bits are the
    /// magnitude; bits 8 to 10 are ignored.
    pub fn branch_offset(imm: u32) -> i32 {
        let magnitude = (imm & 0xff) as i32;
        if (imm >> 11) & 1 == 1 {
            -magnitude
        } else {
            magnitude
        }
    }
}
