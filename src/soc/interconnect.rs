//! Event Fabric.
//!
//! This module implements the host that clocks every component and moves
//! events over point-to-point links. Each link joins one output port to
//! one input port with a fixed latency of at least one cycle. Events sent
//! on a port without a link are collected by the host sink, which is how
//! results leave the system.
//!
//! One cycle `c` runs in three phases:
//! 1. Every component ticks in insertion order, collecting sent events.
//! 2. Sent events are routed; an event on a link arrives at `c + latency`.
//! 3. Every event whose arrival is `<= c` is delivered to its receiver,
//!    repeating until none are due.

use std::collections::{BTreeMap, HashMap};

use crate::common::{Cycle, Event, SimError};
use crate::core::{ControlCore, ControlTile};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// Index of a component inside the fabric.
pub type ComponentId = usize;

/// One side of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub component: ComponentId,
    pub port: Port,
}

/// An event that left the system through an unconnected port.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkRecord {
    pub cycle: Cycle,
    pub component: String,
    pub port: Port,
    pub event: Event,
}

/// Clocked container of components and the links between them.
#[derive(Default)]
pub struct Fabric {
    components: Vec<Box<dyn Component>>,
    names: HashMap<String, ComponentId>,
    /// Output endpoint to (input endpoint, latency).
    links: HashMap<Endpoint, (Endpoint, Cycle)>,
    connected_inputs: HashMap<Endpoint, Endpoint>,
    /// Events in flight keyed by (arrival cycle, send sequence).
    in_flight: BTreeMap<(Cycle, u64), (Endpoint, Event)>,
    sequence: u64,
    sink: Vec<SinkRecord>,
    cycle: Cycle,
    started: bool,
}

impl Fabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component. Names must be unique.
    pub fn add(&mut self, component: Box<dyn Component>) -> Result<ComponentId, SimError> {
        let name = component.name().to_string();
        if self.names.contains_key(&name) {
            return Err(SimError::Topology(format!("duplicate component name {name}")));
        }
        let id = self.components.len();
        self.names.insert(name, id);
        self.components.push(component);
        Ok(id)
    }

    /// Looks up a component id by name.
    pub fn id_of(&self, name: &str) -> Result<ComponentId, SimError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| SimError::Topology(format!("unknown component {name}")))
    }

    fn endpoint(&self, name: &str, port: Port) -> Result<Endpoint, SimError> {
        let component = self.id_of(name)?;
        if !self.components[component].ports().contains(&port) {
            return Err(SimError::Topology(format!("{name} has no port {port:?}")));
        }
        Ok(Endpoint { component, port })
    }

    /// Joins an output port to an input port.
    ///
    /// # Arguments
    ///
    /// * `from` - Sending component name and port.
    /// * `to` - Receiving component name and port.
    /// * `latency` - Delivery delay in cycles, at least 1.
    pub fn connect(&mut self, from: (&str, Port), to: (&str, Port), latency: Cycle) -> Result<(), SimError> {
        if latency == 0 {
            return Err(SimError::Topology(format!(
                "link {}:{:?} -> {}:{:?} needs a latency of at least 1",
                from.0, from.1, to.0, to.1
            )));
        }
        let src = self.endpoint(from.0, from.1)?;
        let dst = self.endpoint(to.0, to.1)?;
        if self.links.contains_key(&src) {
            return Err(SimError::Topology(format!("{}:{:?} is already connected", from.0, from.1)));
        }
        if self.connected_inputs.contains_key(&dst) {
            return Err(SimError::Topology(format!("{}:{:?} is already connected", to.0, to.1)));
        }
        self.links.insert(src, (dst, latency));
        self.connected_inputs.insert(dst, src);
        Ok(())
    }

    /// Schedules a host event for delivery on `port` of `name` at cycle `at`.
    pub fn inject(&mut self, at: Cycle, name: &str, port: Port, event: Event) -> Result<(), SimError> {
        let to = self.endpoint(name, port)?;
        self.schedule(at, to, event);
        Ok(())
    }

    fn schedule(&mut self, arrival: Cycle, to: Endpoint, event: Event) {
        self.in_flight.insert((arrival, self.sequence), (to, event));
        self.sequence += 1;
    }

    fn route(&mut self, from: ComponentId, out: &mut Outbox, cycle: Cycle) {
        for (port, event) in out.take() {
            let src = Endpoint { component: from, port };
            match self.links.get(&src).copied() {
                Some((dst, latency)) => self.schedule(cycle + latency, dst, event),
                None => {
                    let component = self.components[from].name().to_string();
                    log::debug!(target: "fabric", "cycle {} {}:{:?} -> host", cycle, component, port);
                    self.sink.push(SinkRecord {
                        cycle,
                        component,
                        port,
                        event,
                    });
                }
            }
        }
    }

    fn deliver(&mut self, cycle: Cycle) -> Result<(), SimError> {
        loop {
            let due = matches!(self.in_flight.first_key_value(), Some((&(arrival, _), _)) if arrival <= cycle);
            if !due {
                break;
            }
            let Some((_, (to, event))) = self.in_flight.pop_first() else {
                break;
            };
            let mut out = Outbox::new();
            let component = &mut self.components[to.component];
            component
                .handle(to.port, event, cycle, &mut out)
                .map_err(|e| e.within(component.name()))?;
            self.route(to.component, &mut out, cycle);
        }
        Ok(())
    }

    fn start(&mut self) {
        if !self.started {
            self.components.iter_mut().for_each(|c| c.setup());
            self.started = true;
        }
    }

    /// Simulates one cycle.
    pub fn step(&mut self) -> Result<(), SimError> {
        self.start();
        let cycle = self.cycle;
        for id in 0..self.components.len() {
            let mut out = Outbox::new();
            let component = &mut self.components[id];
            component
                .tick(cycle, &mut out)
                .map_err(|e| e.within(component.name()))?;
            self.route(id, &mut out, cycle);
        }
        self.deliver(cycle)?;
        self.cycle += 1;
        Ok(())
    }

    /// True when every component is idle and no event is in flight.
    pub fn is_quiescent(&self) -> bool {
        self.in_flight.is_empty() && self.components.iter().all(|c| c.is_quiescent())
    }

    /// Runs until the system is quiescent or `max_cycles` have elapsed.
    ///
    /// # Returns
    ///
    /// The number of cycles simulated so far.
    pub fn run(&mut self, max_cycles: Cycle) -> Result<Cycle, SimError> {
        self.start();
        while self.cycle < max_cycles && !self.is_quiescent() {
            self.step()?;
        }
        if !self.is_quiescent() {
            log::warn!(target: "fabric", "stopped at cycle limit {} before the system went idle", max_cycles);
        }
        Ok(self.cycle)
    }

    /// Reports every component's statistics for the cycles elapsed so far.
    pub fn finish(&mut self, sink: &mut dyn StatSink) {
        let elapsed = self.cycle;
        self.components.iter_mut().for_each(|c| c.finish(elapsed, sink));
    }

    /// Cycles simulated so far.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Events that left the system, in send order.
    pub fn sink(&self) -> &[SinkRecord] {
        &self.sink
    }

    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.names.get(name).map(|&id| self.components[id].as_ref())
    }

    pub fn control_core(&self, name: &str) -> Option<&ControlCore> {
        self.component(name)?.as_control_core()
    }

    pub fn control_tile(&self, name: &str) -> Option<&ControlTile> {
        self.component(name)?.as_control_tile()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
