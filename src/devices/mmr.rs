//! Match Register.
//!
//! Extracts up to eight row indices from each half of a decision vector.
//! The vector arrives on `Data` as `[positive || negative]`; a request
//! destructively pulls the lowest set indices out of each half and answers
//! with sixteen bytes on `Response`, padded with the sentinel.

use crate::common::{BusyUnit, Cycle, Event, SimError};
use crate::config::EngineConfig;
use crate::sim::logging::{category, TraceMask};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// Output slot value meaning "no further match".
pub const SENTINEL: u8 = 255;

/// Indices extracted per half.
pub const SLOTS_PER_HALF: usize = 8;

/// Pulls up to eight indices of set entries out of `bits`, clearing each one.
///
/// Extraction stops at the first missing set entry or at an index that the
/// sentinel would shadow.
pub fn extract(bits: &mut [u8], slots: &mut [u8]) {
    for slot in slots.iter_mut().take(SLOTS_PER_HALF) {
        match bits.iter().position(|&b| b == 1) {
            Some(index) if index < SENTINEL as usize => {
                *slot = index as u8;
                bits[index] = 0;
            }
            _ => break,
        }
    }
}

/// A match register component.
pub struct Mmr {
    name: String,
    rows: usize,
    up: Vec<u8>,
    un: Vec<u8>,
    unit: BusyUnit<u32>,
    active_cycles: u64,
    trace: TraceMask,
}

impl Mmr {
    pub fn new(name: &str, config: &EngineConfig, trace: TraceMask) -> Self {
        Self {
            name: name.to_string(),
            rows: config.num_row,
            up: Vec::new(),
            un: Vec::new(),
            unit: BusyUnit::new(config.latency),
            active_cycles: 0,
            trace,
        }
    }

    /// Replaces the decision vector; the first `rows` bytes are the positive half.
    pub fn load(&mut self, data: &[u8]) {
        let split = self.rows.min(data.len());
        self.up = data[..split].to_vec();
        self.un = data[split..].to_vec();
    }

    /// Extracts the next indices of both halves.
    ///
    /// # Returns
    ///
    /// Eight positive then eight negative indices, sentinel-padded.
    pub fn extract_indices(&mut self) -> Vec<u8> {
        let mut out = vec![SENTINEL; 2 * SLOTS_PER_HALF];
        let (pos, neg) = out.split_at_mut(SLOTS_PER_HALF);
        extract(&mut self.up, pos);
        extract(&mut self.un, neg);
        out
    }
}

impl Component for Mmr {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<Port> {
        vec![Port::Request, Port::Data, Port::Response]
    }

    fn tick(&mut self, cycle: Cycle, out: &mut Outbox) -> Result<(), SimError> {
        if let Some(request) = self.unit.poll(cycle) {
            self.unit.start(cycle, request);
        }
        if self.unit.complete(cycle).is_some() {
            let indices = self.extract_indices();
            self.active_cycles += 1;
            if self.trace.allows(category::MMR) {
                log::trace!(target: "mmr", "{}: cycle {} pos={:?} neg={:?}", self.name, cycle, &indices[..8], &indices[8..]);
            }
            out.send(Port::Response, Event::core(0, 0, 0, indices));
        }
        Ok(())
    }

    fn handle(&mut self, port: Port, event: Event, cycle: Cycle, _out: &mut Outbox) -> Result<(), SimError> {
        match port {
            Port::Request => {
                self.unit.enqueue(cycle, event.imm());
                Ok(())
            }
            Port::Data => {
                self.load(event.payload());
                Ok(())
            }
            _ => Err(SimError::UnexpectedEvent {
                port,
                opcode: event.opcode(),
            }),
        }
    }

    fn finish(&mut self, _elapsed_cycles: Cycle, sink: &mut dyn StatSink) {
        sink.record(&self.name, "active_cycles", self.active_cycles as f64);
    }

    fn is_quiescent(&self) -> bool {
        self.unit.is_idle()
    }
}
