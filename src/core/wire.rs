//! # Wire Codec
//!
//! Stateless primitives for the Protobuf-compatible wire format.
//!
//! ## Wire Format
//! ```text
//! [Key varint = (tag << 3) | wire_type] [Value]
//!
//! wire_type 0: varint          (int*, uint*, sint*, bool, enum)
//! wire_type 1: fixed64 LE      (double, fixed64, sfixed64)
//! wire_type 2: length-delimited [len varint][len bytes] (string, bytes, message, packed)
//! wire_type 5: fixed32 LE      (float, fixed32, sfixed32)
//! ```
//!
//! ## Security
//! - Varints are capped at 10 bytes; the 10th byte may only carry bit 0
//! - Every read is bounds-checked before slicing
//! - Length prefixes are validated against the remaining input before use

use bytes::BufMut;

use crate::error::{IibinError, Result};

/// Maximum encoded size of a 64-bit varint
pub const MAX_VARINT_LEN: usize = 10;

/// Largest field number representable in a key (2^29 - 1)
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Wire types understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    /// Get the 3-bit wire type identifier
    pub fn as_u8(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }

    /// Detect wire type from identifier bits. Groups (3, 4) are not supported.
    pub fn from_u8(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Build a field key from its tag and wire type.
#[inline]
pub fn make_key(tag: u32, wire_type: WireType) -> u64 {
    (u64::from(tag) << 3) | u64::from(wire_type.as_u8())
}

/// Split a key into tag and wire type, rejecting tag 0 and group wire types.
pub fn split_key(key: u64) -> Result<(u32, WireType)> {
    let tag = key >> 3;
    if tag == 0 || tag > u64::from(MAX_TAG) {
        return Err(IibinError::InvalidKey(key));
    }
    let wire_type = WireType::from_u8((key & 0x07) as u8).ok_or(IibinError::InvalidKey(key))?;
    Ok((tag as u32, wire_type))
}

/// Append a varint to `buf`.
#[inline]
pub fn put_varint<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Append a field key to `buf`.
#[inline]
pub fn put_key<B: BufMut>(buf: &mut B, tag: u32, wire_type: WireType) {
    put_varint(buf, make_key(tag, wire_type));
}

/// Number of bytes `value` occupies as a varint.
#[inline]
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Encode a varint into a fresh byte vector.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(varint_len(value));
    put_varint(&mut out, value);
    out
}

/// Decode a varint from the front of `buf`, returning the value and bytes consumed.
///
/// # Errors
/// - `TruncatedBuffer` if the input ends before a terminating byte
/// - `MalformedVarint` if ten groups pass without termination or the value overflows 64 bits
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(IibinError::MalformedVarint);
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    if buf.len() >= MAX_VARINT_LEN {
        Err(IibinError::MalformedVarint)
    } else {
        Err(IibinError::TruncatedBuffer {
            needed: buf.len() + 1,
            available: buf.len(),
        })
    }
}

#[inline]
pub fn encode_fixed32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

#[inline]
pub fn encode_fixed64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Decode a little-endian u32 from the front of `buf`.
pub fn decode_fixed32(buf: &[u8]) -> Result<u32> {
    if buf.len() < 4 {
        return Err(IibinError::TruncatedBuffer {
            needed: 4,
            available: buf.len(),
        });
    }
    Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// Decode a little-endian u64 from the front of `buf`.
pub fn decode_fixed64(buf: &[u8]) -> Result<u64> {
    if buf.len() < 8 {
        return Err(IibinError::TruncatedBuffer {
            needed: 8,
            available: buf.len(),
        });
    }
    Ok(u64::from_le_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ]))
}

#[inline]
pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline]
pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Bounds-checked cursor over an input buffer.
///
/// Every read either advances past a complete item or fails without
/// moving the cursor past the end of the input.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, consumed) = decode_varint(&self.buf[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn read_fixed32(&mut self) -> Result<u32> {
        let value = decode_fixed32(&self.buf[self.pos..])?;
        self.pos += 4;
        Ok(value)
    }

    pub fn read_fixed64(&mut self) -> Result<u64> {
        let value = decode_fixed64(&self.buf[self.pos..])?;
        self.pos += 8;
        Ok(value)
    }

    /// Borrow the next `len` bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(IibinError::TruncatedBuffer {
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read a length prefix followed by that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        // Validate before converting so a huge claim cannot wrap on 32-bit targets
        if len > self.remaining() as u64 {
            return Err(IibinError::TruncatedBuffer {
                needed: usize::try_from(len).unwrap_or(usize::MAX),
                available: self.remaining(),
            });
        }
        self.read_bytes(len as usize)
    }

    pub fn read_key(&mut self) -> Result<(u32, WireType)> {
        let key = self.read_varint()?;
        split_key(key)
    }

    /// Skip exactly one value of the given wire type.
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.read_bytes(8)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::Fixed32 => {
                self.read_bytes(4)?;
            }
        }
        Ok(())
    }
}
