//! Instruction set of the control cores.
//!
//! Programs are generated offline as a flat table of unsigned 32-bit words,
//! seven per instruction: `opcode, rd, rs1, rs2, imm, funct3, funct7`. The
//! numeric opcode selects one of twelve instruction classes at decode time.

use crate::common::SimError;

/// Number of words per instruction in a flattened instruction table.
pub const INSTRUCTION_FIELDS: usize = 7;

/// Numeric opcodes understood by the decode table.
pub mod opcodes {
    pub const RET: u32 = 0;
    pub const LOAD: u32 = 3;
    pub const LOAD_FP: u32 = 7;
    pub const COPY: u32 = 11;
    pub const OP_IMM: u32 = 19;
    pub const STORE: u32 = 35;
    pub const STORE_FP: u32 = 39;
    pub const CUSTOM: u32 = 43;
    pub const OP: u32 = 51;
    pub const LUI: u32 = 55;
    pub const OP_FP: u32 = 83;
    pub const BRANCH: u32 = 99;
}

/// Instruction class selected by the numeric opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InstrClass {
    /// Vector copy out of data memory to a device or router link.
    Copy,
    /// Integer load.
    Load,
    /// Float load.
    LoadFp,
    /// Register-immediate integer operation.
    #[default]
    OpImm,
    /// Integer store.
    Store,
    /// Float store.
    StoreFp,
    /// Register-register integer operation.
    Op,
    /// Load upper immediate.
    Lui,
    /// Float operation.
    OpFp,
    /// Conditional branch.
    Branch,
    /// End of program.
    Ret,
    /// One-shot device command (CAM, MPE or MMR).
    Custom,
}

impl InstrClass {
    /// Maps a numeric opcode to its class.
    ///
    /// Opcodes missing from the table fall back to `OpImm` instead of
    /// failing, so a mis-encoded word silently runs as an arithmetic
    /// instruction. Controllers without device links pass
    /// `custom_enabled = false`, which sends the custom opcode down the same
    /// fallback.
    ///
    /// # Returns
    ///
    /// The class and whether the fallback was taken.
    pub fn from_opcode(opcode: u32, custom_enabled: bool) -> (Self, bool) {
        let class = match opcode {
            opcodes::RET => InstrClass::Ret,
            opcodes::COPY => InstrClass::Copy,
            opcodes::LOAD => InstrClass::Load,
            opcodes::LOAD_FP => InstrClass::LoadFp,
            opcodes::OP_IMM => InstrClass::OpImm,
            opcodes::STORE => InstrClass::Store,
            opcodes::STORE_FP => InstrClass::StoreFp,
            opcodes::OP => InstrClass::Op,
            opcodes::LUI => InstrClass::Lui,
            opcodes::OP_FP => InstrClass::OpFp,
            opcodes::BRANCH => InstrClass::Branch,
            opcodes::CUSTOM if custom_enabled => InstrClass::Custom,
            _ => return (InstrClass::OpImm, true),
        };
        (class, false)
    }

    /// Numeric opcode carried by events emitted for this class.
    pub fn opcode(self) -> u32 {
        match self {
            InstrClass::Copy => opcodes::COPY,
            InstrClass::Load => opcodes::LOAD,
            InstrClass::LoadFp => opcodes::LOAD_FP,
            InstrClass::OpImm => opcodes::OP_IMM,
            InstrClass::Store => opcodes::STORE,
            InstrClass::StoreFp => opcodes::STORE_FP,
            InstrClass::Op => opcodes::OP,
            InstrClass::Lui => opcodes::LUI,
            InstrClass::OpFp => opcodes::OP_FP,
            InstrClass::Branch => opcodes::BRANCH,
            InstrClass::Ret => opcodes::RET,
            InstrClass::Custom => opcodes::CUSTOM,
        }
    }
}

/// One entry of instruction memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u32,
    pub rd: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub imm: u32,
    pub funct3: u32,
    pub funct7: u32,
}

impl Instruction {
    /// Builds an instruction from its seven fields in table order.
    pub fn from_fields(fields: [u32; INSTRUCTION_FIELDS]) -> Self {
        let [opcode, rd, rs1, rs2, imm, funct3, funct7] = fields;
        Self {
            opcode,
            rd,
            rs1,
            rs2,
            imm,
            funct3,
            funct7,
        }
    }

    /// Flattens the instruction back into table order.
    pub fn to_fields(self) -> [u32; INSTRUCTION_FIELDS] {
        [
            self.opcode,
            self.rd,
            self.rs1,
            self.rs2,
            self.imm,
            self.funct3,
            self.funct7,
        ]
    }
}

/// Splits a flattened instruction table into instructions.
///
/// # Arguments
///
/// * `table` - Words in groups of seven.
///
/// # Returns
///
/// The instruction memory image, or `MalformedProgram` when the table length
/// is not a multiple of seven.
pub fn parse_table(table: &[u32]) -> Result<Vec<Instruction>, SimError> {
    if table.len() % INSTRUCTION_FIELDS != 0 {
        return Err(SimError::MalformedProgram(table.len()));
    }
    Ok(table
        .chunks_exact(INSTRUCTION_FIELDS)
        .map(|chunk| {
            let mut fields = [0u32; INSTRUCTION_FIELDS];
            fields.copy_from_slice(chunk);
            Instruction::from_fields(fields)
        })
        .collect())
}

/// Flattens instructions into a table suitable for a workload file.
pub fn flatten(program: &[Instruction]) -> Vec<u32> {
    program.iter().flat_map(|inst| inst.to_fields()).collect()
}
