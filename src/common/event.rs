//! Events exchanged between components.
//!
//! Two shapes travel over links: the short `Core` form used between a control
//! core and its devices, and the wider `Network` form that additionally
//! carries two source fields for router traffic. Both are variants of one
//! enum so routing code matches exhaustively instead of down-casting.

/// Opcode carried by vector copies (the copy instruction class).
pub const OP_COPY: u32 = 11;

/// Opcode carried by device commands (the custom instruction class).
pub const OP_CUSTOM: u32 = 43;

/// A message travelling over a link.
///
/// Ownership moves into the link on send and into the receiving handler on
/// delivery.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Core-to-device traffic.
    Core {
        opcode: u32,
        dst: u32,
        imm: u32,
        payload: Vec<u8>,
    },
    /// Router and tile traffic.
    Network {
        opcode: u32,
        dst: u32,
        src1: u32,
        src2: u32,
        imm: u32,
        payload: Vec<u8>,
    },
}

impl Event {
    /// Builds a `Core` event.
    pub fn core(opcode: u32, dst: u32, imm: u32, payload: Vec<u8>) -> Self {
        Event::Core {
            opcode,
            dst,
            imm,
            payload,
        }
    }

    /// Builds a `Network` event.
    pub fn network(opcode: u32, dst: u32, src1: u32, src2: u32, imm: u32, payload: Vec<u8>) -> Self {
        Event::Network {
            opcode,
            dst,
            src1,
            src2,
            imm,
            payload,
        }
    }

    pub fn opcode(&self) -> u32 {
        match self {
            Event::Core { opcode, .. } | Event::Network { opcode, .. } => *opcode,
        }
    }

    pub fn dst(&self) -> u32 {
        match self {
            Event::Core { dst, .. } | Event::Network { dst, .. } => *dst,
        }
    }

    pub fn imm(&self) -> u32 {
        match self {
            Event::Core { imm, .. } | Event::Network { imm, .. } => *imm,
        }
    }

    /// Source fields of a `Network` event; zero for `Core` events.
    pub fn sources(&self) -> (u32, u32) {
        match self {
            Event::Network { src1, src2, .. } => (*src1, *src2),
            Event::Core { .. } => (0, 0),
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Event::Core { payload, .. } | Event::Network { payload, .. } => payload,
        }
    }

    /// Consumes the event and returns its payload.
    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Event::Core { payload, .. } | Event::Network { payload, .. } => payload,
        }
    }
}
