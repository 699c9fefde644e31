use crate::common::SimError;
use crate::core::isa::InstrClass;
use crate::core::pipeline::{ControlVariant, Pipeline};

/// Writes results back to the register files and retires return instructions.
pub fn wb_stage<V: ControlVariant>(p: &mut Pipeline, variant: &V) -> Result<bool, SimError> {
    let wb = p.state.mem_wb;

    match wb.class {
        InstrClass::Load | InstrClass::OpImm | InstrClass::Op | InstrClass::Lui => {
            p.regs.int.write(wb.rd, wb.rs1)?;
        }
        InstrClass::OpFp | InstrClass::LoadFp => {
            p.regs.fp.write(wb.rd, wb.frs1)?;
        }
        InstrClass::Ret => {
            p.state.ended = true;
            log::debug!(target: variant.log_target(), "{}: program ended", p.name);
        }
        _ => {}
    }

    if p.tracing(variant.trace_category()) {
        log::trace!(target: variant.log_target(), "{}: WB  {:?} rd={}", p.name, wb.class, wb.rd);
    }

    Ok(true)
}
