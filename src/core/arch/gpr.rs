//! Integer Register File.
//!
//! Thirty-two 32-bit integer registers. There is no hardwired zero:
//! register 0 is an ordinary register and programs keep it at zero by
//! convention.

use crate::common::SimError;

/// Number of architectural integer registers.
pub const NUM_GPR: usize = 32;

/// Integer register file.
#[derive(Clone, Debug, Default)]
pub struct Gpr {
    regs: [u32; NUM_GPR],
}

impl Gpr {
    /// Creates a register file with every register cleared.
    pub fn new() -> Self {
        Self { regs: [0; NUM_GPR] }
    }

    /// Reads an integer register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index taken from an instruction field.
    ///
    /// # Returns
    ///
    /// The register value, or `RegisterOutOfRange` for an index past 31.
    pub fn read(&self, idx: u32) -> Result<u32, SimError> {
        self.regs
            .get(idx as usize)
            .copied()
            .ok_or(SimError::RegisterOutOfRange(idx))
    }

    /// Writes an integer register.
    pub fn write(&mut self, idx: u32, val: u32) -> Result<(), SimError> {
        let slot = self
            .regs
            .get_mut(idx as usize)
            .ok_or(SimError::RegisterOutOfRange(idx))?;
        *slot = val;
        Ok(())
    }

    /// Formats registers in rows of four for trace output.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..NUM_GPR).step_by(4) {
            out.push_str(&format!(
                "x{:<2}={:<10} x{:<2}={:<10} x{:<2}={:<10} x{:<2}={:<10}\n",
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
