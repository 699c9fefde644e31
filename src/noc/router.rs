//! Reduction and broadcast router.
//!
//! One node of the router tree. Upward, it collects the 4-byte float
//! results its children send, groups them by tag (`imm`), sums each group
//! and sends one result per tag to its parent. Downward, it broadcasts every
//! vector from its parent to all children unchanged.

use crate::common::{data, BusyUnit, Cycle, DelayQueue, Event, SimError};
use crate::sim::logging::{category, TraceMask};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// Results of one tag collected during an upward scan.
#[derive(Clone, Debug, PartialEq)]
pub struct TagGroup {
    pub opcode: u32,
    pub dst: u32,
    pub src1: u32,
    pub src2: u32,
    pub imm: u32,
    /// Concatenated 4-byte little-endian singles, in arrival order.
    pub payload: Vec<u8>,
}

impl TagGroup {
    fn open(event: &Event, word: &[u8]) -> Self {
        let (src1, src2) = event.sources();
        Self {
            opcode: event.opcode(),
            dst: event.dst(),
            src1,
            src2,
            imm: event.imm(),
            payload: word.to_vec(),
        }
    }

    /// Sums the singles in order, starting from zero.
    pub fn sum(&self) -> f32 {
        self.payload
            .chunks_exact(4)
            .filter_map(data::f32_from_le)
            .fold(0.0f32, |acc, v| acc + v)
    }
}

/// Groups child results by tag, preserving first-seen tag order.
///
/// Only the first four payload bytes of each event take part.
pub fn group_by_tag(events: Vec<Event>) -> Result<Vec<TagGroup>, SimError> {
    let mut groups: Vec<TagGroup> = Vec::new();
    for event in events {
        let payload = event.payload();
        let word = payload.get(..4).ok_or(SimError::MalformedPayload {
            len: payload.len(),
            reason: "aggregation entry needs 4 bytes",
        })?;
        match groups.iter_mut().find(|g| g.imm == event.imm()) {
            Some(group) => group.payload.extend_from_slice(word),
            None => groups.push(TagGroup::open(&event, word)),
        }
    }
    Ok(groups)
}

/// A router tree node.
pub struct Router {
    name: String,
    num_port: usize,
    latency: Cycle,
    from_down: Vec<DelayQueue<Event>>,
    /// Aggregations in flight.
    results: DelayQueue<TagGroup>,
    pending_results: usize,
    /// Broadcast direction.
    down: BusyUnit<Event>,
    active_fpu: u64,
    active_mux: u64,
    trace: TraceMask,
}

impl Router {
    /// Creates a router with `num_port` children.
    pub fn new(name: &str, num_port: usize, latency: Cycle, trace: TraceMask) -> Self {
        let latency = latency.max(1);
        Self {
            name: name.to_string(),
            num_port,
            latency,
            from_down: (0..num_port).map(|_| DelayQueue::new()).collect(),
            results: DelayQueue::new(),
            pending_results: 0,
            down: BusyUnit::new(latency),
            active_fpu: 0,
            active_mux: 0,
            trace,
        }
    }

    pub fn num_port(&self) -> usize {
        self.num_port
    }

    /// Collects up to two ready results per child and starts one aggregation per tag.
    fn scan_up(&mut self, cycle: Cycle) -> Result<(), SimError> {
        let mut arrived = Vec::new();
        for i in 0..2 * self.num_port {
            if let Some(event) = self.from_down[i / 2].pop(cycle) {
                arrived.push(event);
            }
        }
        if arrived.is_empty() {
            return Ok(());
        }

        for group in group_by_tag(arrived)? {
            if self.trace.allows(category::ROUTER) {
                log::trace!(
                    target: "router",
                    "{}: cycle {} tag {} collects {} results",
                    self.name,
                    cycle,
                    group.imm,
                    group.payload.len() / 4
                );
            }
            self.results.push(cycle + self.latency - 1, 0, group);
            self.pending_results += 1;
        }
        Ok(())
    }

    fn complete_up(&mut self, cycle: Cycle, out: &mut Outbox) {
        while let Some(group) = self.results.pop(cycle) {
            self.active_fpu += (group.payload.len() / 4) as u64;
            let sum = group.sum();
            if self.trace.allows(category::ROUTER) {
                log::trace!(target: "router", "{}: cycle {} tag {} sum {}", self.name, cycle, group.imm, sum);
            }
            out.send(
                Port::ToUp,
                Event::network(
                    group.opcode,
                    group.dst,
                    group.src1,
                    group.src2,
                    group.imm,
                    data::f32_to_le(sum).to_vec(),
                ),
            );
            self.pending_results -= 1;
        }
    }

    fn broadcast(&mut self, cycle: Cycle, out: &mut Outbox) {
        if let Some(event) = self.down.poll(cycle) {
            self.down.start(cycle, event);
        }
        if let Some(event) = self.down.complete(cycle) {
            if self.trace.allows(category::ROUTER) {
                log::trace!(
                    target: "router",
                    "{}: cycle {} broadcast {} bytes",
                    self.name,
                    cycle,
                    event.payload().len()
                );
            }
            for child in 0..self.num_port {
                out.send(Port::ToDown(child), event.clone());
                self.active_mux += 1;
            }
        }
    }
}

impl Component for Router {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<Port> {
        let mut ports = vec![Port::FromUp, Port::ToUp];
        for child in 0..self.num_port {
            ports.push(Port::FromDown(child));
            ports.push(Port::ToDown(child));
        }
        ports
    }

    fn tick(&mut self, cycle: Cycle, out: &mut Outbox) -> Result<(), SimError> {
        if self.pending_results == 0 {
            self.scan_up(cycle)?;
        }
        self.complete_up(cycle, out);
        self.broadcast(cycle, out);
        Ok(())
    }

    fn handle(&mut self, port: Port, event: Event, cycle: Cycle, _out: &mut Outbox) -> Result<(), SimError> {
        match port {
            Port::FromUp => {
                self.down.enqueue(cycle, event);
                Ok(())
            }
            Port::FromDown(child) if child < self.num_port => {
                self.from_down[child].push(cycle + 1, 0, event);
                Ok(())
            }
            _ => Err(SimError::UnexpectedEvent {
                port,
                opcode: event.opcode(),
            }),
        }
    }

    fn finish(&mut self, _elapsed_cycles: Cycle, sink: &mut dyn StatSink) {
        sink.record(&self.name, "active_fpu", self.active_fpu as f64);
        sink.record(&self.name, "active_mux", self.active_mux as f64);
    }

    fn is_quiescent(&self) -> bool {
        self.pending_results == 0 && self.down.is_idle() && self.from_down.iter().all(DelayQueue::is_empty)
    }
}
