//! Floating-Point Unit (FPU).
//!
//! This module implements the single-precision unit used in the Execute
//! stage, including the packed FP8 multiply-accumulate used for weighted
//! sums. An FP8 value has the sign in bit 7, a 4-bit exponent with bias 7
//! in bits 6-3 and a 3-bit mantissa in bits 2-0; exponent 0 is denormal.

/// Float operations available to the execute stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpuOp {
    Add,
    Sub,
    Div,
    /// Four-lane FP8 multiply, lanes summed into one single.
    SimdMul,
}

/// Floating-Point Unit (FPU) for single-precision operations.
pub struct Fpu;

impl Fpu {
    /// Executes a floating-point operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The floating-point operation to perform
    /// * `a` - First operand
    /// * `b` - Second operand
    ///
    /// # Returns
    ///
    /// The single-precision result.
    pub fn execute(op: FpuOp, a: f32, b: f32) -> f32 {
        match op {
            FpuOp::Add => a + b,
            FpuOp::Sub => a - b,
            FpuOp::Div => a / b,
            FpuOp::SimdMul => Self::simd_mul(a, b),
        }
    }

    /// Decodes one FP8 byte.
    ///
    /// # Returns
    ///
    /// `sign * 2^-6 * (man * 2^-3)` for exponent 0, otherwise
    /// `sign * 2^(exp-7) * (1 + man * 2^-3)`. Every FP8 value is exact in f32.
    pub fn fp8_to_f32(fp8: u8) -> f32 {
        let sign = if fp8 >> 7 == 1 { -1.0f32 } else { 1.0f32 };
        let exp = ((fp8 >> 3) & 0x0f) as i32;
        let man = (fp8 & 0x07) as f32;
        if exp == 0 {
            sign * 2.0f32.powi(-6) * (man * 2.0f32.powi(-3))
        } else {
            sign * 2.0f32.powi(exp - 7) * (1.0 + man * 2.0f32.powi(-3))
        }
    }

    /// Multiplies two packed FP8x4 operands lane by lane and sums the lanes.
    ///
    /// The bit patterns of `a` and `b` are split into four bytes, least
    /// significant first; each pair is decoded, multiplied and accumulated
    /// in single precision in that order.
    pub fn simd_mul(a: f32, b: f32) -> f32 {
        let (a_bits, b_bits) = (a.to_bits(), b.to_bits());
        let mut result = 0.0f32;
        for shift in (0..32).step_by(8) {
            let lane_a = Self::fp8_to_f32(((a_bits >> shift) & 0xff) as u8);
            let lane_b = Self::fp8_to_f32(((b_bits >> shift) & 0xff) as u8);
            result += lane_a * lane_b;
        }
        result
    }
}
