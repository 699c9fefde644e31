use crate::common::SimError;
use crate::core::isa::InstrClass;
use crate::core::pipeline::{ControlVariant, ExMem, IdEx, Pipeline};
use crate::core::units::alu::{Alu, AluOp};
use crate::core::units::fpu::Fpu;

fn unmapped(id: &IdEx) -> SimError {
    SimError::UnmappedFunction {
        stage: "execute",
        class: id.class,
        funct3: id.funct3,
        funct7: id.funct7,
    }
}

/// Executes the decoded instruction.
///
/// A taken branch restarts the pipeline at `pc + offset`, where `pc` is the
/// fetch pointer at this point (two past the branch), and produces no output.
pub fn execute_stage<V: ControlVariant>(p: &mut Pipeline, variant: &V) -> Result<bool, SimError> {
    let id = p.state.id_ex;
    let mut ex = ExMem {
        class: id.class,
        rd: id.rd,
        rs1: id.rs1,
        rs2: id.rs2,
        frs1: id.frs1,
        frs2: id.frs2,
        imm: id.imm,
        funct3: id.funct3,
    };

    match id.class {
        InstrClass::Load | InstrClass::LoadFp if variant.gather_loads() => match id.funct3 {
            // Gather keeps the packed positions in rs1 and the base in imm.
            0 => {}
            2 => {
                p.stats.alu += 1;
                ex.rs1 = Alu::execute(AluOp::Add, id.rs1, id.imm);
            }
            _ => return Err(unmapped(&id)),
        },
        InstrClass::Load | InstrClass::LoadFp | InstrClass::Store | InstrClass::StoreFp => {
            p.stats.alu += 1;
            ex.rs1 = Alu::execute(AluOp::Add, id.rs1, id.imm);
        }
        InstrClass::OpImm => {
            p.stats.alu += 1;
            let op = match id.funct3 {
                0 => AluOp::Add,
                1 => AluOp::Shl,
                _ => return Err(unmapped(&id)),
            };
            ex.rs1 = Alu::execute(op, id.rs1, id.imm);
        }
        InstrClass::Op => {
            p.stats.alu += 1;
            let op = match (id.funct3, id.funct7) {
                (0, 0) => AluOp::Add,
                (0, 1) => AluOp::Mul,
                _ => return Err(unmapped(&id)),
            };
            ex.rs1 = Alu::execute(op, id.rs1, id.rs2);
        }
        InstrClass::Lui => {
            p.stats.alu += 1;
            ex.rs1 = id.imm << 12;
        }
        InstrClass::OpFp => {
            p.stats.fpu += 1;
            let op = variant.fpu_op(id.funct7).ok_or_else(|| unmapped(&id))?;
            ex.frs1 = Fpu::execute(op, id.frs1, id.frs2);
        }
        InstrClass::Branch => {
            p.stats.alu += 1;
            let taken = match id.funct3 {
                0 => id.rs1 == id.rs2,
                1 => id.rs1 != id.rs2,
                _ => return Err(unmapped(&id)),
            };
            if taken {
                let target = p.state.pc.wrapping_add_signed(Alu::branch_offset(id.imm));
                if p.tracing(variant.trace_category()) {
                    log::trace!(target: variant.log_target(), "{}: EX  branch taken -> {}", p.name, target);
                }
                p.reset(target);
                return Ok(false);
            }
        }
        InstrClass::Copy | InstrClass::Custom | InstrClass::Ret => {}
    }

    if p.tracing(variant.trace_category()) {
        log::trace!(
            target: variant.log_target(),
            "{}: EX  {:?} rs1={:#x} frs1={}",
            p.name,
            ex.class,
            ex.rs1,
            ex.frs1
        );
    }

    p.state.ex_mem = ex;
    Ok(true)
}
