//! # Varint — variable-length integer codec
//!
//! Packs unsigned integers into a little-endian base-128 encoding: each
//! byte carries 7 payload bits, and the high bit signals "more bytes
//! follow". Small values therefore cost a single byte, and the terminator
//! byte (high bit clear) makes the encoding self-delimiting — a decoder
//! never needs to know the total buffer length.
//!
//! The store uses this codec for value sizes and data offsets. Encoders
//! return the number of bytes written so callers can track the widest
//! offset they ever emitted and size fixed-width slot records from it.
//!
//! ## Encoding
//!
//! ```text
//! 0x00..=0x7f            1 byte    payload
//! 0x80..                 n bytes   [1xxxxxxx]* [0xxxxxxx], LSB group first
//! ```
//!
//! A `u64` packs into 1–9 bytes (values below 2^63, the store's offset
//! domain), a `u32` into 1–5. A run of continuation bytes longer than
//! that is rejected as [`VarintError::Overflow`].
//!
//! ## Example
//!
//! ```rust
//! let mut buf = Vec::new();
//! let n = varint::pack_long(&mut buf, 300).unwrap();
//! assert_eq!(n, 2);
//! assert_eq!(varint::unpack_long(&mut &buf[..]).unwrap(), 300);
//! ```

use std::io::{self, Read, Write};
use thiserror::Error;

/// Longest legal encoding of a `u64` offset (covers values below 2^63).
pub const MAX_LONG_BYTES: usize = 9;
/// Longest legal encoding of a `u32`.
pub const MAX_INT_BYTES: usize = 5;

/// Errors that can occur while decoding a varint.
#[derive(Debug, Error)]
pub enum VarintError {
    /// An underlying I/O error (including EOF mid-value).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The continuation bit never cleared within the legal length.
    #[error("varint continuation overflow")]
    Overflow,
}

/// Packs `value` into `w`, returning the number of bytes written (1–9).
///
/// Values must stay below 2^63 to round-trip through [`unpack_long`]; the
/// store only ever packs file offsets and sizes, which are far below that.
pub fn pack_long<W: Write>(w: &mut W, mut value: u64) -> io::Result<usize> {
    let mut written = 1;
    while value & !0x7F != 0 {
        w.write_all(&[(value as u8 & 0x7F) | 0x80])?;
        value >>= 7;
        written += 1;
    }
    w.write_all(&[value as u8])?;
    Ok(written)
}

/// Packs `value` into `w`, returning the number of bytes written (1–5).
pub fn pack_int<W: Write>(w: &mut W, mut value: u32) -> io::Result<usize> {
    let mut written = 1;
    while value & !0x7F != 0 {
        w.write_all(&[(value as u8 & 0x7F) | 0x80])?;
        value >>= 7;
        written += 1;
    }
    w.write_all(&[value as u8])?;
    Ok(written)
}

/// Packs `value` into the front of `buf`, returning the bytes used.
///
/// Used to fill the fixed-width offset field of an index slot. The caller
/// guarantees `buf` is at least as wide as the encoding (slot offset
/// fields are sized from the maximum encoded length ever observed).
pub fn pack_long_into(buf: &mut [u8], mut value: u64) -> usize {
    let mut pos = 0;
    while value & !0x7F != 0 {
        buf[pos] = (value as u8 & 0x7F) | 0x80;
        value >>= 7;
        pos += 1;
    }
    buf[pos] = value as u8;
    pos + 1
}

/// Decodes a `u64` from a byte stream.
pub fn unpack_long<R: Read>(r: &mut R) -> Result<u64, VarintError> {
    let mut byte = [0u8; 1];
    let mut result = 0u64;
    for i in 0..MAX_LONG_BYTES {
        r.read_exact(&mut byte)?;
        result |= u64::from(byte[0] & 0x7F) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(VarintError::Overflow)
}

/// Decodes a `u32` from a byte stream.
pub fn unpack_int<R: Read>(r: &mut R) -> Result<u32, VarintError> {
    let mut byte = [0u8; 1];
    let mut result = 0u32;
    for i in 0..MAX_INT_BYTES {
        r.read_exact(&mut byte)?;
        result |= u32::from(byte[0] & 0x7F) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(VarintError::Overflow)
}

/// Decodes a `u64` from `buf` starting at `offset`.
///
/// The terminator byte delimits the value, so trailing bytes (the rest of
/// a slot's offset field, zero-padded) are never touched.
pub fn unpack_long_at(buf: &[u8], offset: usize) -> Result<u64, VarintError> {
    let mut result = 0u64;
    for i in 0..MAX_LONG_BYTES {
        let b = *buf
            .get(offset + i)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        result |= u64::from(b & 0x7F) << (7 * i);
        if b & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(VarintError::Overflow)
}

#[cfg(test)]
mod tests;
