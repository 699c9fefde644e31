//! Floating-Point Register File.

use crate::common::SimError;

/// Number of architectural float registers.
pub const NUM_FPR: usize = 32;

/// Single-precision register file.
#[derive(Clone, Debug, Default)]
pub struct Fpr {
    regs: [f32; NUM_FPR],
}

impl Fpr {
    pub fn new() -> Self {
        Self { regs: [0.0; NUM_FPR] }
    }

    /// Reads a float register, failing on an index past 31.
    pub fn read(&self, idx: u32) -> Result<f32, SimError> {
        self.regs
            .get(idx as usize)
            .copied()
            .ok_or(SimError::RegisterOutOfRange(idx))
    }

    /// Writes a float register, failing on an index past 31.
    pub fn write(&mut self, idx: u32, val: f32) -> Result<(), SimError> {
        let slot = self
            .regs
            .get_mut(idx as usize)
            .ok_or(SimError::RegisterOutOfRange(idx))?;
        *slot = val;
        Ok(())
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..NUM_FPR).step_by(4) {
            out.push_str(&format!(
                "f{:<2}={:<12.5} f{:<2}={:<12.5} f{:<2}={:<12.5} f{:<2}={:<12.5}\n",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1],
                i + 2,
                self.regs[i + 2],
                i + 3,
                self.regs[i + 3]
            ));
        }
        out
    }
}
