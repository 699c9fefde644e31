//! Controller Personality Interface.
//!
//! The five-stage engine is shared by the control core and the tile
//! controller. Everything that differs between them (the custom opcode,
//! the load addressing modes, the float operation table and where a copied
//! vector goes) is answered by a `ControlVariant`.

use crate::common::SimError;
use crate::core::memory::DataMemory;
use crate::core::units::fpu::FpuOp;
use crate::soc::traits::Outbox;

/// Behavior that distinguishes one controller personality from another.
pub trait ControlVariant {
    /// Log target of the pipeline messages.
    fn log_target(&self) -> &'static str;

    /// Trace category bit of the pipeline messages.
    fn trace_category(&self) -> u32;

    /// Whether opcode 43 decodes to the custom class.
    fn custom_enabled(&self) -> bool;

    /// Whether loads honor funct3 (0 gather, 2 address) instead of always
    /// computing `rs1 + imm`.
    fn gather_loads(&self) -> bool;

    /// Maps the funct7 field of a float operation to a unit operation.
    fn fpu_op(&self, funct7: u32) -> Option<FpuOp>;

    /// Emits the one-shot device command of a custom instruction at decode.
    ///
    /// Personalities without device links never decode the custom class,
    /// so the default rejects every function.
    fn dispatch_custom(&self, funct3: u32, _imm: u32, _out: &mut Outbox) -> Result<(), SimError> {
        Err(SimError::UnmappedFunction {
            stage: "decode",
            class: crate::core::isa::InstrClass::Custom,
            funct3,
            funct7: 0,
        })
    }

    /// Sends `size` bytes starting at `addr` to the destination selected by `funct3`.
    ///
    /// # Arguments
    ///
    /// * `memory` - Data memory of the sending controller; some personalities
    ///   update memory-mapped state after a send.
    /// * `dest` - Value of `x[rd]`, the destination offset on the receiver.
    /// * `addr` - Source address in data memory.
    /// * `size` - Number of bytes.
    /// * `funct3` - Destination selector.
    /// * `out` - Outbound events of the current cycle.
    fn send_vector(
        &self,
        memory: &mut DataMemory,
        dest: u32,
        addr: u32,
        size: u32,
        funct3: u32,
        out: &mut Outbox,
    ) -> Result<(), SimError>;
}
