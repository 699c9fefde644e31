//! Pipeline Latches and Stage Flags.
//!
//! This module defines the data structures that sit between pipeline stages
//! and the per-stage flag pair that governs advancement. It provides:
//! 1. **Stage Flags:** `update` (the stage holds an output for its successor)
//!    and `ready` (the stage may accept new input).
//! 2. **Latches:** IF/ID, ID/EX, EX/MEM and MEM/WB registers carrying one
//!    instruction each.
//! 3. **Reset:** Clearing every flag and latch on a taken branch.

use crate::core::isa::InstrClass;

/// Advancement flags of one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageFlags {
    /// The stage produced an output that its successor has not consumed yet.
    pub update: bool,
    /// The stage can accept new input.
    pub ready: bool,
}

impl Default for StageFlags {
    fn default() -> Self {
        Self {
            update: false,
            ready: true,
        }
    }
}

/// IF/ID latch: the instruction memory index that was fetched.
#[derive(Clone, Copy, Debug, Default)]
pub struct IfId {
    pub pc: u32,
}

/// ID/EX latch.
///
/// Integer operands are captured as register values at decode time, except
/// `rd` which holds a register index for writing classes and the value of
/// `x[rd]` for the copy class.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdEx {
    pub class: InstrClass,
    pub rd: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub frs1: f32,
    pub frs2: f32,
    pub imm: u32,
    pub funct3: u32,
    pub funct7: u32,
}

/// EX/MEM latch.
///
/// `rs1` carries the integer result or effective address and `frs1` the
/// float result.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExMem {
    pub class: InstrClass,
    pub rd: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub frs1: f32,
    pub frs2: f32,
    pub imm: u32,
    pub funct3: u32,
}

/// MEM/WB latch.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemWb {
    pub class: InstrClass,
    pub rd: u32,
    pub rs1: u32,
    pub frs1: f32,
}

/// Complete state of the five-stage pipeline apart from the register file.
#[derive(Clone, Debug, Default)]
pub struct PipelineState {
    /// Next instruction memory index to fetch.
    pub pc: u32,
    pub fetch: StageFlags,
    pub decode: StageFlags,
    pub execute: StageFlags,
    pub memory: StageFlags,
    pub write: StageFlags,
    pub if_id: IfId,
    pub id_ex: IdEx,
    pub ex_mem: ExMem,
    pub mem_wb: MemWb,
    /// Set once a return instruction retires.
    pub ended: bool,
}

impl PipelineState {
    /// Creates a pipeline with every stage ready and nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all in-flight work and restarts fetching at `pc`.
    ///
    /// Every stage becomes ready, no stage holds output and every latch is
    /// zeroed. `ended` is preserved.
    pub fn reset(&mut self, pc: u32) {
        let ended = self.ended;
        *self = Self {
            pc,
            ended,
            ..Self::default()
        };
    }

    /// True when no instruction is waiting between two stages.
    pub fn is_drained(&self) -> bool {
        !(self.fetch.update || self.decode.update || self.execute.update || self.memory.update)
    }
}
