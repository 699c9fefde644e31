//! Data memory of a control core.
//!
//! A flat, byte-addressable buffer owned by exactly one core. Fixed offsets
//! inside it act as memory-mapped status bytes (arrival flags, double-buffer
//! selector, device result areas); the layout belongs to the core personality.
//! Words and singles are stored little-endian. Every access is bounds checked
//! and an out-of-range access is fatal.

use crate::common::data;
use crate::common::SimError;

/// Byte-addressable data memory.
#[derive(Clone, Debug, Default)]
pub struct DataMemory {
    bytes: Vec<u8>,
}

impl DataMemory {
    /// Creates memory from an initial image, zero-padded to at least `min_size` bytes.
    ///
    /// # Arguments
    ///
    /// * `image` - Initial contents starting at address 0.
    /// * `min_size` - Minimum size in bytes; the memory-mapped regions of a
    ///   personality must fit inside it.
    pub fn new(image: &[u8], min_size: usize) -> Self {
        let mut bytes = image.to_vec();
        if bytes.len() < min_size {
            bytes.resize(min_size, 0);
        }
        Self { bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>, SimError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(SimError::MemoryOutOfRange {
                addr,
                len,
                size: self.bytes.len(),
            }),
        }
    }

    pub fn read_u8(&self, addr: u32) -> Result<u8, SimError> {
        let r = self.range(addr as u64, 1)?;
        Ok(self.bytes[r.start])
    }

    pub fn write_u8(&mut self, addr: u32, val: u8) -> Result<(), SimError> {
        let r = self.range(addr as u64, 1)?;
        self.bytes[r.start] = val;
        Ok(())
    }

    /// Reads a little-endian 32-bit word.
    pub fn read_u32(&self, addr: u32) -> Result<u32, SimError> {
        let r = self.range(addr as u64, 4)?;
        data::u32_from_le(&self.bytes[r]).ok_or(SimError::MemoryOutOfRange {
            addr: addr as u64,
            len: 4,
            size: self.bytes.len(),
        })
    }

    /// Writes a little-endian 32-bit word.
    pub fn write_u32(&mut self, addr: u32, val: u32) -> Result<(), SimError> {
        let r = self.range(addr as u64, 4)?;
        self.bytes[r].copy_from_slice(&data::u32_to_le(val));
        Ok(())
    }

    /// Reads a little-endian IEEE-754 single.
    pub fn read_f32(&self, addr: u32) -> Result<f32, SimError> {
        self.read_u32(addr).map(f32::from_bits)
    }

    /// Writes a little-endian IEEE-754 single.
    pub fn write_f32(&mut self, addr: u32, val: f32) -> Result<(), SimError> {
        let r = self.range(addr as u64, 4)?;
        self.bytes[r].copy_from_slice(&data::f32_to_le(val));
        Ok(())
    }

    /// Gathers a word from four scattered byte positions.
    ///
    /// Each byte of `positions` names a memory offset (relative to `base`).
    /// The byte found at the offset encoded in the most significant byte of
    /// `positions` becomes the most significant byte of the result, and so
    /// on down to the least significant byte.
    ///
    /// # Arguments
    ///
    /// * `positions` - Four packed byte offsets.
    /// * `base` - Offset added to every position.
    pub fn gather_u32(&self, positions: u32, base: u32) -> Result<u32, SimError> {
        let mut value = 0u32;
        for shift in [24u32, 16, 8, 0] {
            let offset = ((positions >> shift) & 0xff) as u64 + base as u64;
            let r = self.range(offset, 1)?;
            value |= (self.bytes[r.start] as u32) << shift;
        }
        Ok(value)
    }

    /// Gathers a word like `gather_u32` and reinterprets it as a single.
    pub fn gather_f32(&self, positions: u32, base: u32) -> Result<f32, SimError> {
        self.gather_u32(positions, base).map(f32::from_bits)
    }

    /// Copies `len` bytes starting at `addr` out of memory.
    pub fn read_bytes(&self, addr: u32, len: u32) -> Result<Vec<u8>, SimError> {
        let r = self.range(addr as u64, len as usize)?;
        Ok(self.bytes[r].to_vec())
    }

    /// Copies `src` into memory starting at `addr`.
    pub fn write_bytes(&mut self, addr: u32, src: &[u8]) -> Result<(), SimError> {
        let r = self.range(addr as u64, src.len())?;
        self.bytes[r].copy_from_slice(src);
        Ok(())
    }

    /// Whole memory contents, for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
