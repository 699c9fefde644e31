//! Tile Controller.
//!
//! Sits between a leaf router and the control cores of one tile. It
//! broadcasts query vectors from the router to its cores, accumulates the
//! partial results the cores send back, and forwards the tile's sum up the
//! router tree tagged with the tile's index class. It runs the same
//! five-stage engine as a control core, without the custom device class.

use crate::common::event::OP_COPY;
use crate::common::{data, Cycle, Event, SimError};
use crate::core::isa::{InstrClass, Instruction};
use crate::core::memory::DataMemory;
use crate::core::pipeline::{ControlVariant, Pipeline};
use crate::core::units::fpu::FpuOp;
use crate::sim::logging::{category, TraceMask};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// Inbound router vector.
pub const INPUT: u32 = 0;
/// Accumulated partial result (f32).
pub const PARTIAL_SUM: u32 = 16528;
/// Set to 1 when a router vector arrives.
pub const INPUT_FLAG: u32 = 16536;
/// Set to 1 when a core result arrives.
pub const RESULT_FLAG: u32 = 16540;
/// Default data memory size in bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 16544;

/// Tile controller personality of the pipeline engine.
#[derive(Clone, Copy, Debug)]
pub struct TileVariant {
    pub num_core: usize,
    /// Tag attached to results sent to the router.
    pub index_class: u32,
}

impl ControlVariant for TileVariant {
    fn log_target(&self) -> &'static str {
        "tile"
    }

    fn trace_category(&self) -> u32 {
        category::TILE_PIPELINE
    }

    fn custom_enabled(&self) -> bool {
        false
    }

    fn gather_loads(&self) -> bool {
        false
    }

    fn fpu_op(&self, funct7: u32) -> Option<FpuOp> {
        match funct7 {
            0 => Some(FpuOp::Add),
            12 => Some(FpuOp::Div),
            _ => None,
        }
    }

    fn send_vector(
        &self,
        memory: &mut DataMemory,
        _dest: u32,
        addr: u32,
        size: u32,
        funct3: u32,
        out: &mut Outbox,
    ) -> Result<(), SimError> {
        match funct3 {
            0 => {
                let bytes = memory.read_bytes(addr, size)?;
                out.send(Port::ToRouter, Event::network(OP_COPY, 0, 0, 0, self.index_class, bytes));
                memory.write_u32(PARTIAL_SUM, 0)?;
            }
            1 => {
                let bytes = memory.read_bytes(addr, size)?;
                for core in 0..self.num_core {
                    out.send(Port::ToCore(core), Event::network(OP_COPY, 0, 0, 0, 0, bytes.clone()));
                }
            }
            _ => {
                return Err(SimError::UnmappedFunction {
                    stage: "memory",
                    class: InstrClass::Copy,
                    funct3,
                    funct7: 0,
                })
            }
        }
        Ok(())
    }
}

/// A tile controller.
pub struct ControlTile {
    pipeline: Pipeline,
    variant: TileVariant,
}

impl ControlTile {
    /// Creates a tile controller.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique component name.
    /// * `program` - Instruction memory.
    /// * `image` - Initial data memory contents.
    /// * `memory_size` - Data memory size; raised to the memory map if smaller.
    /// * `num_core` - Cores attached to this tile.
    /// * `index_class` - Tag of the results this tile produces.
    /// * `trace` - Enabled trace categories.
    pub fn new(
        name: &str,
        program: Vec<Instruction>,
        image: &[u8],
        memory_size: usize,
        num_core: usize,
        index_class: u32,
        trace: TraceMask,
    ) -> Self {
        let memory = DataMemory::new(image, memory_size.max(DEFAULT_MEMORY_SIZE));
        Self {
            pipeline: Pipeline::new(name, program, memory, trace),
            variant: TileVariant { num_core, index_class },
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn memory(&self) -> &DataMemory {
        &self.pipeline.memory
    }

    pub fn index_class(&self) -> u32 {
        self.variant.index_class
    }

    /// Adds a core's partial result to the running sum.
    fn accumulate(&mut self, payload: &[u8], cycle: Cycle) -> Result<(), SimError> {
        let value = data::f32_from_le(payload).ok_or(SimError::MalformedPayload {
            len: payload.len(),
            reason: "partial result needs 4 bytes",
        })?;
        let memory = &mut self.pipeline.memory;
        let sum = memory.read_f32(PARTIAL_SUM)? + value;
        memory.write_f32(PARTIAL_SUM, sum)?;
        memory.write_u8(RESULT_FLAG, 1)?;
        self.pipeline.stats.memory += 2;

        if self.pipeline.trace.allows(category::TILE_RESULT) {
            log::trace!(target: "tile", "{}: cycle {} partial {} sum {}", self.pipeline.name, cycle, value, sum);
        }
        Ok(())
    }
}

impl Component for ControlTile {
    fn name(&self) -> &str {
        &self.pipeline.name
    }

    fn ports(&self) -> Vec<Port> {
        let mut ports = vec![Port::ToRouter, Port::FromRouter];
        for core in 0..self.variant.num_core {
            ports.push(Port::ToCore(core));
            ports.push(Port::FromCore(core));
        }
        ports
    }

    fn setup(&mut self) {
        if self.pipeline.program.is_empty() {
            log::info!(target: "tile", "{}: no program loaded, tile stays idle", self.pipeline.name);
            self.pipeline.state.ended = true;
        }
    }

    fn tick(&mut self, _cycle: Cycle, out: &mut Outbox) -> Result<(), SimError> {
        self.pipeline.tick(&self.variant, out)
    }

    fn handle(&mut self, port: Port, event: Event, cycle: Cycle, _out: &mut Outbox) -> Result<(), SimError> {
        let opcode = event.opcode();
        match port {
            Port::FromCore(_) if opcode == OP_COPY => self.accumulate(event.payload(), cycle),
            Port::FromRouter if opcode == OP_COPY => {
                let payload = event.into_payload();
                if self.pipeline.trace.allows(category::DATA) {
                    log::trace!(target: "tile", "{}: cycle {} input of {} bytes", self.pipeline.name, cycle, payload.len());
                }
                self.pipeline.memory.write_bytes(INPUT, &payload)?;
                self.pipeline.memory.write_u8(INPUT_FLAG, 1)
            }
            _ => Err(SimError::UnexpectedEvent { port, opcode }),
        }
    }

    fn finish(&mut self, _elapsed_cycles: Cycle, sink: &mut dyn StatSink) {
        self.pipeline.stats.report(&self.pipeline.name, sink);
    }

    fn is_quiescent(&self) -> bool {
        self.pipeline.ended()
    }

    fn as_control_tile(&self) -> Option<&ControlTile> {
        Some(self)
    }
}
