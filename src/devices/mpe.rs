//! Match Processing Element.
//!
//! Keeps bit-serial running statistics per CAM row across repeated
//! searches: a Hamming-style distance `n`, a subset count `s`, a running
//! conjunction `p`, and the decision vectors `up`/`un` derived from them.
//! Match vectors arrive on `Data` from the CAM; commands arrive on
//! `Request` with the command selector in `imm`.

use crate::common::{BusyUnit, Cycle, Event, SimError};
use crate::config::EngineConfig;
use crate::sim::logging::{category, TraceMask};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// Command selectors carried in the request `imm`.
pub mod commands {
    pub const RESET: u32 = 0;
    pub const LOAD_TEST: u32 = 1;
    pub const LOAD_BASE: u32 = 2;
    pub const UPDATE: u32 = 3;
    pub const READ_NS: u32 = 4;
    pub const DECIDE: u32 = 5;
}

/// Per-row vectors of the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MpeState {
    pub t: Vec<u8>,
    pub b: Vec<u8>,
    pub n: Vec<u8>,
    pub s: Vec<u8>,
    pub p: Vec<u8>,
    pub up: Vec<u8>,
    pub un: Vec<u8>,
}

impl MpeState {
    /// The state produced by the reset command.
    pub fn reset(rows: usize) -> Self {
        Self {
            t: vec![0; rows],
            b: vec![0; rows],
            n: vec![0; rows],
            s: vec![0; rows],
            p: vec![1; rows],
            up: vec![1; rows],
            un: vec![1; rows],
        }
    }

    /// Accumulates one comparison of `t` against `b`.
    pub fn update(&mut self) {
        for l in 0..self.t.len() {
            let (t, b) = (self.t[l], self.b[l]);
            self.n[l] = self.n[l].wrapping_add((t ^ b) & 1);
            self.s[l] = self.s[l].wrapping_add((t & !b) & 1);
            self.p[l] = self.p[l].wrapping_mul((t | b) & 1);
        }
    }

    /// Packs the low three bits of `n` and `s` into one byte per row.
    pub fn pack_ns(&self) -> Vec<u8> {
        self.n
            .iter()
            .zip(&self.s)
            .map(|(&n, &s)| ((n & 0x7) << 3) | (s & 0x7))
            .collect()
    }

    /// Derives the decision vectors and returns `[up || un]`.
    ///
    /// The last row is a sentinel and is always selected in both vectors.
    pub fn decide(&mut self) -> Vec<u8> {
        let rows = self.t.len();
        for l in 0..rows.saturating_sub(1) {
            let (t, b, p) = (self.t[l], self.b[l], self.p[l]);
            self.up[l] = t & !b & p;
            self.un[l] = !t & b & p;
        }
        if let Some(last) = rows.checked_sub(1) {
            self.up[last] = 1;
            self.un[last] = 1;
        }
        let mut out = Vec::with_capacity(2 * rows);
        out.extend_from_slice(&self.up);
        out.extend_from_slice(&self.un);
        out
    }
}

/// A match processing element component.
pub struct Mpe {
    name: String,
    rows: usize,
    /// Most recent match vector, fitted to the row count.
    data: Vec<u8>,
    state: MpeState,
    unit: BusyUnit<u32>,
    active_cycles: u64,
    trace: TraceMask,
}

impl Mpe {
    pub fn new(name: &str, config: &EngineConfig, trace: TraceMask) -> Self {
        Self {
            name: name.to_string(),
            rows: config.num_row,
            data: vec![0; config.num_row],
            state: MpeState::reset(config.num_row),
            unit: BusyUnit::new(config.latency),
            active_cycles: 0,
            trace,
        }
    }

    pub fn state(&self) -> &MpeState {
        &self.state
    }

    pub fn active_cycles(&self) -> u64 {
        self.active_cycles
    }

    /// Executes one command, sending any result to `out`.
    pub fn execute(&mut self, command: u32, out: &mut Outbox) -> Result<(), SimError> {
        match command {
            commands::RESET => self.state = MpeState::reset(self.rows),
            commands::LOAD_TEST => self.state.t = self.data.clone(),
            commands::LOAD_BASE => self.state.b = self.data.clone(),
            commands::UPDATE => self.state.update(),
            commands::READ_NS => out.send(Port::Response, Event::core(0, 0, 0, self.state.pack_ns())),
            commands::DECIDE => {
                let decision = self.state.decide();
                out.send(Port::Output, Event::core(0, 0, 0, decision));
            }
            other => return Err(SimError::UnknownCommand(other)),
        }
        self.active_cycles += 1;

        if self.trace.allows(category::MPE) {
            let ones = |v: &[u8]| v.iter().filter(|&&x| x != 0).count();
            log::trace!(
                target: "mpe",
                "{}: command {} n={:?} s={:?} up={} un={}",
                self.name,
                command,
                &self.state.n[..self.rows.min(4)],
                &self.state.s[..self.rows.min(4)],
                ones(&self.state.up),
                ones(&self.state.un)
            );
        }
        Ok(())
    }
}

impl Component for Mpe {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<Port> {
        vec![Port::Request, Port::Data, Port::Output, Port::Response]
    }

    fn tick(&mut self, cycle: Cycle, out: &mut Outbox) -> Result<(), SimError> {
        if let Some(command) = self.unit.poll(cycle) {
            self.unit.start(cycle, command);
        }
        if let Some(command) = self.unit.complete(cycle) {
            self.execute(command, out)?;
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
                let mut data = event.into_payload();
                data.resize(self.rows, 0);
                self.data = data;
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
