//! Fatal simulation errors.
//!
//! The instruction streams and device images are generated offline, so any
//! of these conditions is a setup or programming defect. They halt the run
//! instead of being recovered from.

use thiserror::Error;

use crate::core::isa::InstrClass;
use crate::soc::traits::Port;

/// Conditions that stop the simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("PC {pc} is out of range (instruction memory holds {len} entries)")]
    PcOutOfRange { pc: u32, len: usize },

    #[error("{stage}: unmapped {class:?} with funct3={funct3} funct7={funct7}")]
    UnmappedFunction {
        stage: &'static str,
        class: InstrClass,
        funct3: u32,
        funct7: u32,
    },

    #[error("register index {0} is out of range")]
    RegisterOutOfRange(u32),

    #[error("access of {len} bytes at {addr} exceeds memory of {size} bytes")]
    MemoryOutOfRange { addr: u64, len: usize, size: usize },

    #[error("unexpected opcode {opcode} on {port:?}")]
    UnexpectedEvent { port: Port, opcode: u32 },

    #[error("unknown device command {0}")]
    UnknownCommand(u32),

    #[error("malformed payload of {len} bytes: {reason}")]
    MalformedPayload { len: usize, reason: &'static str },

    #[error("instruction table of {0} words is not a multiple of 7")]
    MalformedProgram(usize),

    #[error("topology: {0}")]
    Topology(String),

    #[error("[{name}] {source}")]
    InComponent {
        name: String,
        #[source]
        source: Box<SimError>,
    },
}

impl SimError {
    /// Attaches the name of the component the error was raised in.
    pub fn within(self, name: &str) -> Self {
        match self {
            already @ SimError::InComponent { .. } => already,
            other => SimError::InComponent {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Strips any component context and returns the underlying error.
    pub fn root(&self) -> &SimError {
        match self {
            SimError::InComponent { source, .. } => source.root(),
            other => other,
        }
    }
}
