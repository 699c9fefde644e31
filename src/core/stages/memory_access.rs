use crate::common::SimError;
use crate::core::isa::InstrClass;
use crate::core::pipeline::{ControlVariant, ExMem, MemWb, Pipeline};
use crate::soc::traits::Outbox;

fn unmapped(ex: &ExMem) -> SimError {
    SimError::UnmappedFunction {
        stage: "memory",
        class: ex.class,
        funct3: ex.funct3,
        funct7: 0,
    }
}

/// Performs loads, stores and vector copies.
pub fn mem_stage<V: ControlVariant>(p: &mut Pipeline, variant: &V, out: &mut Outbox) -> Result<bool, SimError> {
    let ex = p.state.ex_mem;
    let mut wb = MemWb {
        class: ex.class,
        rd: ex.rd,
        rs1: ex.rs1,
        frs1: ex.frs1,
    };

    match ex.class {
        InstrClass::Copy => {
            p.stats.memory += 1;
            variant.send_vector(&mut p.memory, ex.rd, ex.rs1, ex.rs2, ex.funct3, out)?;
        }
        InstrClass::Load => {
            p.stats.memory += 1;
            wb.rs1 = match (variant.gather_loads(), ex.funct3) {
                (true, 0) => p.memory.gather_u32(ex.rs1, ex.imm)?,
                (true, 2) | (false, _) => p.memory.read_u32(ex.rs1)?,
                _ => return Err(unmapped(&ex)),
            };
        }
        InstrClass::LoadFp => {
            p.stats.memory += 1;
            wb.frs1 = match (variant.gather_loads(), ex.funct3) {
                (true, 0) => p.memory.gather_f32(ex.rs1, ex.imm)?,
                (true, 2) | (false, _) => p.memory.read_f32(ex.rs1)?,
                _ => return Err(unmapped(&ex)),
            };
        }
        InstrClass::Store => {
            p.stats.memory += 1;
            p.memory.write_u32(ex.rs1, ex.rs2)?;
        }
        InstrClass::StoreFp => {
            p.stats.memory += 1;
            p.memory.write_f32(ex.rs1, ex.frs2)?;
        }
        _ => {}
    }

    if p.tracing(variant.trace_category()) {
        log::trace!(target: variant.log_target(), "{}: MEM {:?} addr={:#x}", p.name, ex.class, ex.rs1);
    }

    p.state.mem_wb = wb;
    Ok(true)
}
