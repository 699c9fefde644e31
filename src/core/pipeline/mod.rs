//! Instruction pipeline implementation.
//!
//! This module contains the five-stage in-order engine shared by both
//! controller personalities. Stages advance from the tail to the head
//! within one cycle: a stage runs only when its successor is ready and its
//! input holds an unconsumed output, so an instruction moves at most one
//! stage per cycle and is never processed twice. There is no forwarding:
//! register values are read at decode time, and the instruction streams are
//! generated with enough spacing to make that safe.

/// Inter-stage pipeline latches and stage flags.
pub mod latches;

/// Personality interface implemented by the control core and tile controller.
pub mod traits;

pub use latches::{ExMem, IdEx, IfId, MemWb, PipelineState, StageFlags};
pub use traits::ControlVariant;

use crate::common::SimError;
use crate::core::arch::RegisterFile;
use crate::core::isa::Instruction;
use crate::core::memory::DataMemory;
use crate::core::stages;
use crate::sim::logging::TraceMask;
use crate::soc::traits::Outbox;
use crate::stats::StatSink;

/// Per-stage activity counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub fetch: u64,
    pub decode: u64,
    pub memory: u64,
    pub alu: u64,
    pub fpu: u64,
}

impl PipelineStats {
    /// Reports the counters under the names the statistics report uses.
    pub fn report(&self, component: &str, sink: &mut dyn StatSink) {
        sink.record(component, "active_fetch", self.fetch as f64);
        sink.record(component, "active_decode", self.decode as f64);
        sink.record(component, "active_memory", self.memory as f64);
        sink.record(component, "active_alu", self.alu as f64);
        sink.record(component, "active_fpu", self.fpu as f64);
    }
}

/// One five-stage engine with its architectural state.
pub struct Pipeline {
    /// Component name used in log messages.
    pub name: String,
    pub state: PipelineState,
    pub regs: RegisterFile,
    pub memory: DataMemory,
    /// Instruction memory, indexed by `pc`.
    pub program: Vec<Instruction>,
    pub stats: PipelineStats,
    pub trace: TraceMask,
}

impl Pipeline {
    /// Creates an engine with empty registers, every stage ready and `pc = 0`.
    ///
    /// # Arguments
    ///
    /// * `name` - Component name for diagnostics.
    /// * `program` - Instruction memory.
    /// * `memory` - Data memory, already sized for the personality's map.
    /// * `trace` - Enabled trace categories.
    pub fn new(name: &str, program: Vec<Instruction>, memory: DataMemory, trace: TraceMask) -> Self {
        Self {
            name: name.to_string(),
            state: PipelineState::new(),
            regs: RegisterFile::new(),
            memory,
            program,
            stats: PipelineStats::default(),
            trace,
        }
    }

    /// True once a return instruction has retired.
    pub fn ended(&self) -> bool {
        self.state.ended
    }

    /// Discards in-flight work and restarts fetching at `pc`.
    pub fn reset(&mut self, pc: u32) {
        self.state.reset(pc);
    }

    /// Advances the pipeline by one cycle.
    ///
    /// Stages are visited from writeback to fetch. Each flag is re-read at
    /// the point it is tested, so a branch taken in execute (which resets
    /// every flag and makes every stage ready) still lets fetch run at the
    /// target in the same cycle.
    ///
    /// # Arguments
    ///
    /// * `variant` - Personality supplying opcode, load, float and copy behavior.
    /// * `out` - Outbound events of this cycle.
    pub fn tick<V: ControlVariant>(&mut self, variant: &V, out: &mut Outbox) -> Result<(), SimError> {
        if self.state.ended {
            return Ok(());
        }
        self.advance(variant, out).map_err(|e| {
            log::error!(target: variant.log_target(), "{}: {}\n{}", self.name, e, self.dump_state());
            e
        })
    }

    fn advance<V: ControlVariant>(&mut self, variant: &V, out: &mut Outbox) -> Result<(), SimError> {

        if self.state.write.ready {
            if self.state.memory.update {
                self.state.memory.update = false;
                self.state.write.update = stages::write_back::wb_stage(self, variant)?;
            }
            if self.state.memory.ready {
                if self.state.execute.update {
                    self.state.execute.update = false;
                    self.state.memory.update = stages::memory_access::mem_stage(self, variant, out)?;
                }
                if self.state.execute.ready {
                    if self.state.decode.update {
                        self.state.decode.update = false;
                        self.state.execute.update = stages::execute::execute_stage(self, variant)?;
                    }
                    if self.state.decode.ready {
                        if self.state.fetch.update {
                            self.state.fetch.update = false;
                            self.state.decode.update = stages::decode::decode_stage(self, variant, out)?;
                        }
                        if self.state.fetch.ready {
                            self.state.fetch.update = stages::fetch::fetch_stage(self, variant)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Formats the fetch pointer and both register files.
    pub fn dump_state(&self) -> String {
        format!("pc={}\n{}{}", self.state.pc, self.regs.int.dump(), self.regs.fp.dump())
    }

    /// True when `category` is enabled for this engine's trace output.
    pub(crate) fn tracing(&self, category: u32) -> bool {
        self.trace.allows(category)
    }
}
