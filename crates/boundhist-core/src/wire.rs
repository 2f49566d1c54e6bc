//! Binary wire primitives
//!
//! Fixed-width values are big-endian. Unsigned integers use LEB128 varints,
//! signed integers are zig-zag encoded first. Truncated input surfaces as
//! [`Error::Io`] with `UnexpectedEof`.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Longest valid varint encoding of a `u64`
const MAX_VARINT_LEN: usize = 10;

/// Write a single byte
pub fn write_u8<W: Write + ?Sized>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

/// Read a single byte
pub fn read_u8<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Write a big-endian `f64`, preserving its exact bit pattern
pub fn write_f64<W: Write + ?Sized>(writer: &mut W, value: f64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Read a big-endian `f64`
pub fn read_f64<R: Read + ?Sized>(reader: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_be_bytes(buf))
}

/// Write an unsigned LEB128 varint
pub fn write_varint<W: Write + ?Sized>(writer: &mut W, mut value: u64) -> Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut len = 0;
    while value >= 0x80 {
        buf[len] = (value as u8) | 0x80;
        value >>= 7;
        len += 1;
    }
    buf[len] = value as u8;
    writer.write_all(&buf[..=len])?;
    Ok(())
}

/// Read an unsigned LEB128 varint
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = read_u8(reader)?;
        let payload = u64::from(byte & 0x7F);
        if i == MAX_VARINT_LEN - 1 && payload > 1 {
            return Err(Error::corrupt("varint exceeds 64 bits"));
        }
        value |= payload << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::corrupt("varint exceeds 64 bits"))
}

/// Map a signed integer onto an unsigned one so small magnitudes stay small
///
/// ```rust
/// use boundhist_core::wire::{zigzag_decode, zigzag_encode};
///
/// assert_eq!(zigzag_encode(-1), 1);
/// assert_eq!(zigzag_encode(1), 2);
/// assert_eq!(zigzag_decode(zigzag_encode(i64::MIN)), i64::MIN);
/// ```
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`]
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Write a zig-zag encoded signed varint
pub fn write_signed_varint<W: Write + ?Sized>(writer: &mut W, value: i64) -> Result<()> {
    write_varint(writer, zigzag_encode(value))
}

/// Read a zig-zag encoded signed varint
pub fn read_signed_varint<R: Read + ?Sized>(reader: &mut R) -> Result<i64> {
    Ok(zigzag_decode(read_varint(reader)?))
}

/// Read a zig-zag varint that must fit in an `i32`
pub fn read_i32<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    let value = read_signed_varint(reader)?;
    i32::try_from(value).map_err(|_| Error::corrupt(format!("index {value} out of i32 range")))
}
