use crate::common::SimError;
use crate::core::isa::InstrClass;
use crate::core::pipeline::{ControlVariant, IdEx, Pipeline};

/// Decodes the fetched instruction and reads its register operands.
///
/// A return instruction stops further fetching so the pipeline drains.
/// A custom instruction sends its device command immediately; it occupies
/// the later stages without further effect.
pub fn decode_stage<V: ControlVariant>(
    p: &mut Pipeline,
    variant: &V,
    out: &mut crate::soc::traits::Outbox,
) -> Result<bool, SimError> {
    p.stats.decode += 1;

    let pc = p.state.if_id.pc;
    let inst = *p.program.get(pc as usize).ok_or(SimError::PcOutOfRange {
        pc,
        len: p.program.len(),
    })?;

    let (class, fallback) = InstrClass::from_opcode(inst.opcode, variant.custom_enabled());
    if fallback {
        log::warn!(
            target: variant.log_target(),
            "{}: opcode {} at pc {} is not in the decode table, executing as an immediate op",
            p.name,
            inst.opcode,
            pc
        );
    }

    let int = &p.regs.int;
    let fp = &p.regs.fp;
    let mut id = IdEx {
        class,
        ..IdEx::default()
    };

    match class {
        InstrClass::Copy => {
            id.rd = int.read(inst.rd)?;
            id.rs1 = int.read(inst.rs1)?;
            id.rs2 = int.read(inst.rs2)?;
            id.funct3 = inst.funct3;
        }
        InstrClass::Load | InstrClass::LoadFp | InstrClass::OpImm => {
            id.rd = inst.rd;
            id.rs1 = int.read(inst.rs1)?;
            id.imm = inst.imm;
            id.funct3 = inst.funct3;
        }
        InstrClass::Store => {
            id.rs1 = int.read(inst.rs1)?;
            id.rs2 = int.read(inst.rs2)?;
            id.imm = inst.imm;
            id.funct3 = inst.funct3;
        }
        InstrClass::StoreFp => {
            id.rs1 = int.read(inst.rs1)?;
            id.frs2 = fp.read(inst.rs2)?;
            id.imm = inst.imm;
            id.funct3 = inst.funct3;
        }
        InstrClass::Op => {
            id.rd = inst.rd;
            id.rs1 = int.read(inst.rs1)?;
            id.rs2 = int.read(inst.rs2)?;
            id.funct3 = inst.funct3;
            id.funct7 = inst.funct7;
        }
        InstrClass::OpFp => {
            id.rd = inst.rd;
            id.frs1 = fp.read(inst.rs1)?;
            id.frs2 = fp.read(inst.rs2)?;
            id.funct3 = inst.funct3;
            id.funct7 = inst.funct7;
        }
        InstrClass::Lui => {
            id.rd = inst.rd;
            id.imm = inst.imm;
        }
        InstrClass::Branch => {
            id.rs1 = int.read(inst.rs1)?;
            id.rs2 = int.read(inst.rs2)?;
            id.imm = inst.imm;
            id.funct3 = inst.funct3;
        }
        InstrClass::Ret => {
            p.state.fetch.ready = false;
        }
        InstrClass::Custom => {
            id.funct3 = inst.funct3;
            id.imm = inst.imm;
            variant.dispatch_custom(inst.funct3, inst.imm, out)?;
        }
    }

    if p.tracing(variant.trace_category()) {
        log::trace!(
            target: variant.log_target(),
            "{}: ID  pc={} {:?} rd={} rs1={} rs2={} imm={} f3={} f7={}",
            p.name,
            pc,
            class,
            inst.rd,
            inst.rs1,
            inst.rs2,
            inst.imm,
            inst.funct3,
            inst.funct7
        );
    }

    p.state.id_ex = id;
    Ok(true)
}
