//! System-on-Chip Traits.
//!
//! This module defines the interface every simulated hardware component
//! implements so the fabric can clock it, deliver events to it and collect
//! its statistics uniformly. Components never reference each other: they
//! send events on named ports, and the fabric moves them over links.

use crate::common::{Cycle, Event, SimError};
use crate::core::control_core::ControlCore;
use crate::core::control_tile::ControlTile;
use crate::stats::StatSink;

/// Named endpoint of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Port {
    /// Device command input (CAM, MPE, MMR).
    Request,
    /// Device data input.
    Data,
    /// Device output towards the next device in the chain.
    Output,
    /// Device output back to the issuing core.
    Response,

    ToTile,
    FromTile,
    ToCam,
    ToCamData,
    ToMpe,
    FromMpe,
    ToMmr,
    FromMmr,

    ToRouter,
    FromRouter,
    ToCore(usize),
    FromCore(usize),

    FromUp,
    ToUp,
    FromDown(usize),
    ToDown(usize),
}

/// Events a component sent during one tick or handler call.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Vec<(Port, Event)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` for the link attached to `port`.
    pub fn send(&mut self, port: Port, event: Event) {
        self.sent.push((port, event));
    }

    /// Removes every queued event, in send order.
    pub fn take(&mut self) -> Vec<(Port, Event)> {
        std::mem::take(&mut self.sent)
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }
}

/// A clocked component attached to the fabric.
pub trait Component {
    /// Returns the unique component name.
    ///
    /// Used for statistics, log messages and error context.
    fn name(&self) -> &str;

    /// Ports this component can send on or receive from.
    fn ports(&self) -> Vec<Port>;

    /// Prepares the component before the first cycle.
    fn setup(&mut self) {}

    /// Advances the component by one clock cycle.
    ///
    /// # Arguments
    ///
    /// * `cycle` - Current simulated cycle.
    /// * `out` - Collects the events sent this cycle.
    fn tick(&mut self, cycle: Cycle, out: &mut Outbox) -> Result<(), SimError>;

    /// Handles an event delivered on `port` during `cycle`.
    fn handle(&mut self, port: Port, event: Event, cycle: Cycle, out: &mut Outbox) -> Result<(), SimError>;

    /// Reports final statistics after `elapsed_cycles` simulated cycles.
    fn finish(&mut self, _elapsed_cycles: Cycle, _sink: &mut dyn StatSink) {}

    /// True when the component has no pending work and will not act on its own.
    fn is_quiescent(&self) -> bool;

    /// Downcasts the component to a control core if applicable.
    ///
    /// Used by tests and the CLI to inspect memories after a run.
    fn as_control_core(&self) -> Option<&ControlCore> {
        None
    }

    /// Downcasts the component to a tile controller if applicable.
    fn as_control_tile(&self) -> Option<&ControlTile> {
        None
    }
}
