//! System-on-Chip assembly.
//!
//! Defines the component interface, the fabric that clocks components and
//! moves events between their ports, and the builder that instantiates the
//! accelerator topology.

/// Topology construction from configuration and workload.
pub mod builder;

/// The event fabric and its cycle loop.
pub mod interconnect;

/// Component trait, port names and outbound event buffer.
pub mod traits;

pub use builder::build;
pub use interconnect::{Fabric, SinkRecord};
pub use traits::{Component, Outbox, Port};
