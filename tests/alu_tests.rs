//! Unit tests for ALU operations.

use acam_sim::core::units::alu::{Alu, AluOp};

/// Tests 32-bit addition, including wrap-around.
#[test]
fn test_alu_add() {
    assert_eq!(Alu::execute(AluOp::Add, 10, 20), 30);
    assert_eq!(Alu::execute(AluOp::Add, 0xFFFF_FFFF, 1), 0);
    assert_eq!(Alu::execute(AluOp::Add, 100, 16428), 16528);
}

/// Tests logical left shift, which only honors the low five bits of the amount.
#[test]
fn test_alu_shl() {
    assert_eq!(Alu::execute(AluOp::Shl, 1, 3), 8);
    assert_eq!(Alu::execute(AluOp::Shl, 0x1234_5678, 16), 0x5678_0000);
    assert_eq!(Alu::execute(AluOp::Shl, 1, 31), 0x8000_0000);
    assert_eq!(Alu::execute(AluOp::Shl, 1, 33), 2);
}

/// Tests wrapping multiplication.
#[test]
fn test_alu_mul() {
    assert_eq!(Alu::execute(AluOp::Mul, 6, 7), 42);
    assert_eq!(Alu::execute(AluOp::Mul, 0x8000_0000, 2), 0);
    assert_eq!(Alu::execute(AluOp::Mul, 0xFFFF_FFFF, 0xFFFF_FFFF), 1);
}

/// Tests the sign-magnitude branch offset encoding.
#[test]
fn test_branch_offset() {
    assert_eq!(Alu::branch_offset(5), 5);
    assert_eq!(Alu::branch_offset(0x805), -5);
    assert_eq!(Alu::branch_offset(0xFF), 255);
    assert_eq!(Alu::branch_offset(0x8FF), -255);
    // Bits 8 to 10 carry nothing.
    assert_eq!(Alu::branch_offset(0x703), 3);
    assert_eq!(Alu::branch_offset(0x800), 0);
}
