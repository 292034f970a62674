//! Little-endian primitives for the binary tree format.

use std::io::{self, Read, Write};

use crate::error::TreeError;

#[inline]
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
  writer.write_all(&[value])
}

#[inline]
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
  writer.write_all(&value.to_le_bytes())
}

#[inline]
pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
  writer.write_all(&value.to_le_bytes())
}

#[inline]
pub fn write_f64<W: Write>(writer: &mut W, value: f64) -> io::Result<()> {
  writer.write_all(&value.to_le_bytes())
}

#[inline]
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
  let mut buf = [0u8; 1];
  reader.read_exact(&mut buf)?;
  Ok(buf[0])
}

#[inline]
pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
  let mut buf = [0u8; 4];
  reader.read_exact(&mut buf)?;
  Ok(u32::from_le_bytes(buf))
}

#[inline]
pub fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
  let mut buf = [0u8; 4];
  reader.read_exact(&mut buf)?;
  Ok(i32::from_le_bytes(buf))
}

#[inline]
pub fn read_f64<R: Read>(reader: &mut R) -> io::Result<f64> {
  let mut buf = [0u8; 8];
  reader.read_exact(&mut buf)?;
  Ok(f64::from_le_bytes(buf))
}

/// Write a presence flag byte.
#[inline]
pub fn write_flag<W: Write>(writer: &mut W, present: bool) -> io::Result<()> {
  write_u8(writer, u8::from(present))
}

/// Read a presence flag byte; anything other than 0 or 1 is corruption.
pub fn read_flag<R: Read>(reader: &mut R) -> Result<bool, TreeError> {
  match read_u8(reader).map_err(TreeError::from_read)? {
    0 => Ok(false),
    1 => Ok(true),
    other => Err(TreeError::Corrupt(format!("invalid flag byte {other}"))),
  }
}
