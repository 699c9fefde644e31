//! Unit tests for Floating-Point Unit operations.

use acam_sim::core::units::fpu::{Fpu, FpuOp};

/// Packs four FP8 lanes, least significant first, into a single's bit pattern.
fn pack(lanes: [u8; 4]) -> f32 {
    f32::from_bits(u32::from_le_bytes(lanes))
}

/// Tests single-precision add, subtract and divide.
#[test]
fn test_fpu_basic_ops() {
    assert_eq!(Fpu::execute(FpuOp::Add, 1.5, 2.25), 3.75);
    assert_eq!(Fpu::execute(FpuOp::Sub, 1.5, 2.25), -0.75);
    assert_eq!(Fpu::execute(FpuOp::Div, 7.5, 2.5), 3.0);
    assert!(Fpu::execute(FpuOp::Div, 1.0, 0.0).is_infinite());
}

/// Tests decoding of normal FP8 values.
#[test]
fn test_fp8_normal_values() {
    // exp 7, man 0 -> 1.0
    assert_eq!(Fpu::fp8_to_f32(0b0_0111_000), 1.0);
    // exp 8, man 4 -> 2 * 1.5
    assert_eq!(Fpu::fp8_to_f32(0b0_1000_100), 3.0);
    // exp 6, man 0 -> 0.5
    assert_eq!(Fpu::fp8_to_f32(0b0_0110_000), 0.5);
    // sign bit
    assert_eq!(Fpu::fp8_to_f32(0b1_0111_000), -1.0);
    // largest: exp 15, man 7 -> 2^8 * 1.875
    assert_eq!(Fpu::fp8_to_f32(0x7F), 480.0);
}

/// Tests decoding of denormal FP8 values.
#[test]
fn test_fp8_denormal_values() {
    assert_eq!(Fpu::fp8_to_f32(0), 0.0);
    // man 1 -> 2^-6 * 2^-3
    assert_eq!(Fpu::fp8_to_f32(1), 2.0f32.powi(-9));
    assert_eq!(Fpu::fp8_to_f32(0x87), -7.0 * 2.0f32.powi(-9));
}

/// Tests the four-lane multiply-accumulate.
#[test]
fn test_simd_mul_accumulates_lanes() {
    let one = 0b0_0111_000;
    let two = 0b0_1000_000;
    let three = 0b0_1000_100;

    let a = pack([one, two, three, 0]);
    let b = pack([two, two, one, three]);
    // 1*2 + 2*2 + 3*1 + 0*3
    assert_eq!(Fpu::execute(FpuOp::SimdMul, a, b), 9.0);
}

/// Tests that a negative lane subtracts from the sum.
#[test]
fn test_simd_mul_signed_lanes() {
    let one = 0b0_0111_000;
    let neg_one = 0b1_0111_000;
    let a = pack([one, neg_one, 0, 0]);
    let b = pack([one, one, 0, 0]);
    assert_eq!(Fpu::simd_mul(a, b), 0.0);
    assert_eq!(Fpu::simd_mul(pack([neg_one, 0, 0, 0]), pack([one, 0, 0, 0])), -1.0);
}
