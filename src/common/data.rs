//! Little-endian byte codecs.
//!
//! Memory images, router payloads and register spills all store 32-bit
//! integers and IEEE-754 singles as four little-endian bytes. These helpers
//! are the only place where raw bytes turn into numbers.

/// Decodes four little-endian bytes into a `u32`.
///
/// # Returns
///
/// `None` when `bytes` holds fewer than four bytes. Extra bytes are ignored.
pub fn u32_from_le(bytes: &[u8]) -> Option<u32> {
    let word: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(word))
}

/// Decodes four little-endian bytes into an IEEE-754 single.
pub fn f32_from_le(bytes: &[u8]) -> Option<f32> {
    u32_from_le(bytes).map(f32::from_bits)
}

/// Encodes a `u32` as four little-endian bytes.
pub fn u32_to_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Encodes an IEEE-754 single as four little-endian bytes.
pub fn f32_to_le(value: f32) -> [u8; 4] {
    value.to_bits().to_le_bytes()
}
