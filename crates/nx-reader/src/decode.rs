//! Payload decoders.
//!
//! Every node carries a fixed 8-byte payload whose meaning depends on its
//! type tag. These functions are total: any 8 bytes decode to a value, and
//! narrower integer types only look at the low bytes of the buffer.

use byteorder::{ByteOrder, LittleEndian};

/// Raw node payload.
pub type Payload = [u8; 8];

/// A pair of signed 32-bit coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    /// Create a new vector.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Decode the low 2 bytes as `u16`.
#[inline]
pub fn to_u16(payload: &Payload) -> u16 {
    LittleEndian::read_u16(&payload[..2])
}

/// Decode the low 2 bytes as `i16`.
#[inline]
pub fn to_i16(payload: &Payload) -> i16 {
    LittleEndian::read_i16(&payload[..2])
}

/// Decode the low 4 bytes as `u32`.
#[inline]
pub fn to_u32(payload: &Payload) -> u32 {
    LittleEndian::read_u32(&payload[..4])
}

/// Decode the low 4 bytes as `i32`.
#[inline]
pub fn to_i32(payload: &Payload) -> i32 {
    LittleEndian::read_i32(&payload[..4])
}

/// Decode all 8 bytes as `u64`.
#[inline]
pub fn to_u64(payload: &Payload) -> u64 {
    LittleEndian::read_u64(payload)
}

/// Decode all 8 bytes as `i64`.
#[inline]
pub fn to_i64(payload: &Payload) -> i64 {
    LittleEndian::read_i64(payload)
}

/// Reinterpret all 8 bytes as an IEEE-754 double.
#[inline]
pub fn to_f64(payload: &Payload) -> f64 {
    LittleEndian::read_f64(payload)
}

/// Only the byte value `1` is true.
#[inline]
pub fn to_bool(byte: u8) -> bool {
    byte == 1
}

/// Low 4 bytes are X, high 4 bytes are Y.
#[inline]
pub fn to_vector(payload: &Payload) -> Vector {
    Vector {
        x: LittleEndian::read_i32(&payload[..4]),
        y: LittleEndian::read_i32(&payload[4..]),
    }
}
