//! Control Core.
//!
//! The per-cell controller. It runs the five-stage engine over its own
//! instruction and data memories, drives its CAM, MPE and MMR with one-shot
//! custom commands, streams query vectors into the CAM data lines and
//! exchanges vectors with its tile controller. Inbound vectors and device
//! responses land at fixed offsets of data memory, where the program polls
//! for them.
//!
//! # Memory map
//!
//! | Offset | Contents |
//! |--------|----------|
//! | 128 / 256 | receive double buffer for vectors from the tile |
//! | 384 | MPE response (packed match counts) |
//! | 1152 | MMR response (positive then negative indices) |
//! | 1192 | buffer selector, incremented on every received vector |

use crate::common::{Cycle, Event, SimError};
use crate::common::event::{OP_COPY, OP_CUSTOM};
use crate::core::isa::{InstrClass, Instruction};
use crate::core::memory::DataMemory;
use crate::core::pipeline::{ControlVariant, Pipeline};
use crate::core::units::fpu::FpuOp;
use crate::sim::logging::{category, TraceMask};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// First receive buffer.
pub const RECV_BUFFER_A: u32 = 128;
/// Second receive buffer, used while the selector byte is non-zero.
pub const RECV_BUFFER_B: u32 = 256;
/// MPE response area.
pub const MPE_RESULT: u32 = 384;
/// MMR response area.
pub const MMR_RESULT: u32 = 1152;
/// Receive buffer selector byte.
pub const BUFFER_SELECT: u32 = 1192;
/// Default data memory size in bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 2048;

/// Control core personality of the pipeline engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreVariant;

impl ControlVariant for CoreVariant {
    fn log_target(&self) -> &'static str {
        "core"
    }

    fn trace_category(&self) -> u32 {
        category::CORE_PIPELINE
    }

    fn custom_enabled(&self) -> bool {
        true
    }

    fn gather_loads(&self) -> bool {
        true
    }

    fn fpu_op(&self, funct7: u32) -> Option<FpuOp> {
        match funct7 {
            0 => Some(FpuOp::Add),
            4 => Some(FpuOp::Sub),
            8 => Some(FpuOp::SimdMul),
            _ => None,
        }
    }

    fn dispatch_custom(&self, funct3: u32, imm: u32, out: &mut Outbox) -> Result<(), SimError> {
        let port = match funct3 {
            0 => Port::ToCam,
            1 => Port::ToMpe,
            2 => Port::ToMmr,
            _ => {
                return Err(SimError::UnmappedFunction {
                    stage: "decode",
                    class: InstrClass::Custom,
                    funct3,
                    funct7: 0,
                })
            }
        };
        out.send(port, Event::core(OP_CUSTOM, 0, imm, vec![0]));
        Ok(())
    }

    fn send_vector(
        &self,
        memory: &mut DataMemory,
        dest: u32,
        addr: u32,
        size: u32,
        funct3: u32,
        out: &mut Outbox,
    ) -> Result<(), SimError> {
        let event = match funct3 {
            0 => (Port::ToTile, Event::network(OP_COPY, 0, 0, 0, 0, memory.read_bytes(addr, size)?)),
            2 => (Port::ToCamData, Event::core(OP_COPY, dest, 0, memory.read_bytes(addr, size)?)),
            _ => {
                return Err(SimError::UnmappedFunction {
                    stage: "memory",
                    class: InstrClass::Copy,
                    funct3,
                    funct7: 0,
                })
            }
        };
        out.send(event.0, event.1);
        Ok(())
    }
}

/// A control core attached to one CAM, MPE and MMR.
pub struct ControlCore {
    pipeline: Pipeline,
    variant: CoreVariant,
}

impl ControlCore {
    /// Creates a core.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique component name.
    /// * `program` - Instruction memory.
    /// * `image` - Initial data memory contents.
    /// * `memory_size` - Data memory size; raised to the memory map if smaller.
    /// * `trace` - Enabled trace categories.
    pub fn new(name: &str, program: Vec<Instruction>, image: &[u8], memory_size: usize, trace: TraceMask) -> Self {
        let memory = DataMemory::new(image, memory_size.max(DEFAULT_MEMORY_SIZE));
        Self {
            pipeline: Pipeline::new(name, program, memory, trace),
            variant: CoreVariant,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn memory(&self) -> &DataMemory {
        &self.pipeline.memory
    }

    /// Receive buffer the next vector from the tile is written to.
    fn recv_buffer(&self) -> Result<u32, SimError> {
        Ok(if self.pipeline.memory.read_u8(BUFFER_SELECT)? != 0 {
            RECV_BUFFER_B
        } else {
            RECV_BUFFER_A
        })
    }
}

impl Component for ControlCore {
    fn name(&self) -> &str {
        &self.pipeline.name
    }

    fn ports(&self) -> Vec<Port> {
        vec![
            Port::ToTile,
            Port::FromTile,
            Port::ToCam,
            Port::ToCamData,
            Port::ToMpe,
            Port::FromMpe,
            Port::ToMmr,
            Port::FromMmr,
        ]
    }

    fn setup(&mut self) {
        if self.pipeline.program.is_empty() {
            log::info!(target: "core", "{}: no program loaded, core stays idle", self.pipeline.name);
            self.pipeline.state.ended = true;
        }
    }

    fn tick(&mut self, _cycle: Cycle, out: &mut Outbox) -> Result<(), SimError> {
        self.pipeline.tick(&self.variant, out)
    }

    fn handle(&mut self, port: Port, event: Event, cycle: Cycle, _out: &mut Outbox) -> Result<(), SimError> {
        let opcode = event.opcode();
        let addr = match port {
            Port::FromTile if opcode == OP_COPY => self.recv_buffer()?,
            Port::FromMpe => MPE_RESULT,
            Port::FromMmr => MMR_RESULT,
            _ => return Err(SimError::UnexpectedEvent { port, opcode }),
        };

        let payload = event.into_payload();
        if self.pipeline.trace.allows(category::DATA) {
            log::trace!(
                target: "core",
                "{}: cycle {} {:?} {} bytes -> {}",
                self.pipeline.name,
                cycle,
                port,
                payload.len(),
                addr
            );
        }
        self.pipeline.memory.write_bytes(addr, &payload)?;

        if port == Port::FromTile {
            let select = self.pipeline.memory.read_u8(BUFFER_SELECT)?;
            self.pipeline.memory.write_u8(BUFFER_SELECT, select.wrapping_add(1))?;
        }
        Ok(())
    }

    fn finish(&mut self, _elapsed_cycles: Cycle, sink: &mut dyn StatSink) {
        self.pipeline.stats.report(&self.pipeline.name, sink);
    }

    fn is_quiescent(&self) -> bool {
        self.pipeline.ended()
    }

    fn as_control_core(&self) -> Option<&ControlCore> {
        Some(self)
    }
}
