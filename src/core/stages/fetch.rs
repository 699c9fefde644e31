use crate::common::SimError;
use crate::core::pipeline::{ControlVariant, IfId, Pipeline};

/// Latches the instruction memory index at `pc` and advances `pc`.
///
/// The activity counter is incremented even when the fetch fails.
pub fn fetch_stage<V: ControlVariant>(p: &mut Pipeline, variant: &V) -> Result<bool, SimError> {
    p.stats.fetch += 1;

    let pc = p.state.pc;
    if pc as usize >= p.program.len() {
        return Err(SimError::PcOutOfRange {
            pc,
            len: p.program.len(),
        });
    }

    if p.tracing(variant.trace_category()) {
        log::trace!(target: variant.log_target(), "{}: IF  pc={}", p.name, pc);
    }

    p.state.if_id = IfId { pc };
    p.state.pc = pc.wrapping_add(1);
    Ok(true)
}
